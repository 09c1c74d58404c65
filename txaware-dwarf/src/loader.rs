//! ELFとDWARFの読み込み機能

use crate::{DwarfReader, Result};
use object::{Object, ObjectSection};
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// DWARFローダー
pub struct DwarfLoader {
    /// オブジェクトファイル
    object_file: Rc<object::File<'static>>,
    /// DWARFコンテキスト
    dwarf: gimli::Dwarf<DwarfReader>,
}

impl DwarfLoader {
    /// ELFファイルからDWARF情報を読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // ファイルを読み込む
        let file_data = fs::read(path)
            .map_err(|e| anyhow::anyhow!("Failed to read file {:?}: {}", path, e))?;

        Self::parse(file_data)
            .map_err(|e| anyhow::anyhow!("Failed to parse ELF file {:?}: {}", path, e))
    }

    /// メモリ上のELFイメージからDWARF情報を読み込む
    pub fn parse(file_data: Vec<u8>) -> Result<Self> {
        // Box::leakで'staticライフタイムを得る（ローダーはプロセス終了まで生存する）
        let file_data: &'static [u8] = Box::leak(file_data.into_boxed_slice());

        // objectクレートでELFファイルをパース
        let object_file = object::File::parse(file_data)
            .map_err(|e| anyhow::anyhow!("Failed to parse object file: {}", e))?;

        let dwarf = load_dwarf_sections(&object_file)?;

        Ok(Self {
            object_file: Rc::new(object_file),
            dwarf,
        })
    }

    /// DWARFコンテキストへの参照を取得
    pub fn dwarf(&self) -> &gimli::Dwarf<DwarfReader> {
        &self.dwarf
    }

    /// DWARFコンテキストを新しく構築する
    ///
    /// addr2lineのように所有権付きのDwarfを要求する利用者向け。
    pub fn load_dwarf(&self) -> Result<gimli::Dwarf<DwarfReader>> {
        load_dwarf_sections(&self.object_file)
    }

    /// オブジェクトファイルへの参照を取得
    pub fn object_file(&self) -> &object::File<'static> {
        &self.object_file
    }

    /// ELFのターゲットアーキテクチャを取得する
    pub fn architecture(&self) -> object::Architecture {
        self.object_file.architecture()
    }

    /// 32bit ARM（Cortex-Mを含む）のELFかどうか
    pub fn is_arm32(&self) -> bool {
        self.architecture() == object::Architecture::Arm
    }

    /// デバッグ情報（.debug_info）を含むかどうか
    pub fn has_debug_info(&self) -> bool {
        self.object_file.section_by_name(".debug_info").is_some()
    }
}

/// DWARFセクションを読み込む
fn load_dwarf_sections(object_file: &object::File<'static>) -> Result<gimli::Dwarf<DwarfReader>> {
    // エンディアンを取得
    let endian = if object_file.is_little_endian() {
        gimli::RunTimeEndian::Little
    } else {
        gimli::RunTimeEndian::Big
    };

    let load_section = |id: gimli::SectionId| -> Result<DwarfReader> {
        let data = object_file
            .section_by_name(id.name())
            .and_then(|section| section.data().ok())
            .unwrap_or(&[]);
        Ok(gimli::EndianSlice::new(data, endian))
    };

    gimli::Dwarf::load(load_section)
        .map_err(|e| anyhow::anyhow!("Failed to load DWARF sections: {}", e))
}
