//! DWARFからの構造体レイアウト抽出
//!
//! カーネル制御ブロック（TX_THREADなど）のフィールドオフセットを、
//! ビルドごとの構成オプションに左右されずに得るために使います。

use crate::{DwarfReader, Result};
use tracing::debug;

/// 修飾型・typedefをたどる最大の深さ
const MAX_TYPE_CHAIN: usize = 8;

/// フィールドのレイアウト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    /// フィールド名
    pub name: String,
    /// 構造体先頭からのオフセット（バイト）
    pub offset: u64,
}

/// 構造体のレイアウト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    pub name: String,
    pub size: u64,
    pub fields: Vec<FieldLayout>,
}

impl StructLayout {
    /// フィールドを名前で検索する
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// フィールドのオフセットを取得する
    pub fn field_offset(&self, name: &str) -> Option<u64> {
        self.field(name).map(|f| f.offset)
    }
}

/// 構造体レイアウト抽出器
pub struct StructLayoutExtractor<'a> {
    dwarf: &'a gimli::Dwarf<DwarfReader>,
}

impl<'a> StructLayoutExtractor<'a> {
    /// 新しい抽出器を作成する
    pub fn new(dwarf: &'a gimli::Dwarf<DwarfReader>) -> Self {
        Self { dwarf }
    }

    /// 構造体名またはtypedef名からレイアウトを検索する
    ///
    /// `TX_THREAD_STRUCT` のような構造体タグ名でも、`TX_THREAD` のようなtypedef名でも
    /// 検索できます。前方宣言（メンバなし）はスキップします。
    pub fn find(&self, name: &str) -> Result<Option<StructLayout>> {
        let mut iter = self.dwarf.units();
        while let Some(header) = iter.next()? {
            let unit = self.dwarf.unit(header)?;

            if let Some(layout) = self.find_in_unit(&unit, name)? {
                debug!("Found struct '{}' in DWARF: size={}, {} fields",
                    layout.name, layout.size, layout.fields.len());
                return Ok(Some(layout));
            }
        }

        debug!("Struct '{}' not found in DWARF", name);
        Ok(None)
    }

    /// ユニット内で構造体を探す
    fn find_in_unit(
        &self,
        unit: &gimli::Unit<DwarfReader>,
        name: &str,
    ) -> Result<Option<StructLayout>> {
        let mut entries = unit.entries();

        while let Some((_, entry)) = entries.next_dfs()? {
            let tag = entry.tag();
            if tag != gimli::DW_TAG_structure_type && tag != gimli::DW_TAG_typedef {
                continue;
            }
            if self.get_name(unit, entry).as_deref() != Some(name) {
                continue;
            }

            let struct_offset = if tag == gimli::DW_TAG_typedef {
                match self.resolve_struct(unit, entry)? {
                    Some(offset) => offset,
                    None => continue,
                }
            } else {
                entry.offset()
            };

            if let Some(layout) = self.extract_struct(unit, struct_offset)? {
                return Ok(Some(layout));
            }
        }

        Ok(None)
    }

    /// typedefや修飾型をたどって構造体DIEのオフセットを得る
    fn resolve_struct(
        &self,
        unit: &gimli::Unit<DwarfReader>,
        entry: &gimli::DebuggingInformationEntry<DwarfReader>,
    ) -> Result<Option<gimli::UnitOffset>> {
        let mut next = self.get_type(entry);

        for _ in 0..MAX_TYPE_CHAIN {
            let Some(offset) = next else {
                return Ok(None);
            };
            let target = unit.entry(offset)?;
            match target.tag() {
                gimli::DW_TAG_structure_type => return Ok(Some(offset)),
                gimli::DW_TAG_typedef
                | gimli::DW_TAG_const_type
                | gimli::DW_TAG_volatile_type => next = self.get_type(&target),
                _ => return Ok(None),
            }
        }

        Ok(None)
    }

    /// 構造体DIEからレイアウトを抽出する
    fn extract_struct(
        &self,
        unit: &gimli::Unit<DwarfReader>,
        offset: gimli::UnitOffset,
    ) -> Result<Option<StructLayout>> {
        let mut tree = unit.entries_tree(Some(offset))?;
        let root = tree.root()?;
        let entry = root.entry();

        // 前方宣言は中身を持たない
        if entry.attr_value(gimli::DW_AT_declaration)?.is_some() {
            return Ok(None);
        }

        let name = self.get_name(unit, entry).unwrap_or_else(|| "<anonymous>".to_string());
        let size = self.get_byte_size(entry).unwrap_or(0);

        let mut fields = Vec::new();
        let mut children = root.children();
        while let Some(child) = children.next()? {
            let member = child.entry();
            if member.tag() != gimli::DW_TAG_member {
                continue;
            }

            let Some(field_name) = self.get_name(unit, member) else {
                continue;
            };
            let Some(field_offset) = self.get_data_member_location(member) else {
                debug!("Member '{}.{}' has no constant location", name, field_name);
                continue;
            };
            fields.push(FieldLayout {
                name: field_name,
                offset: field_offset,
            });
        }

        Ok(Some(StructLayout { name, size, fields }))
    }

    /// 名前を取得する（.debug_str参照にも対応）
    fn get_name(
        &self,
        unit: &gimli::Unit<DwarfReader>,
        entry: &gimli::DebuggingInformationEntry<DwarfReader>,
    ) -> Option<String> {
        let attr = entry.attr_value(gimli::DW_AT_name).ok()??;
        let name = self.dwarf.attr_string(unit, attr).ok()?;
        Some(name.to_string_lossy().into_owned())
    }

    /// バイトサイズを取得する
    fn get_byte_size(&self, entry: &gimli::DebuggingInformationEntry<DwarfReader>) -> Option<u64> {
        entry.attr_value(gimli::DW_AT_byte_size).ok()??.udata_value()
    }

    /// 型参照を取得する
    fn get_type(&self, entry: &gimli::DebuggingInformationEntry<DwarfReader>) -> Option<gimli::UnitOffset> {
        match entry.attr_value(gimli::DW_AT_type).ok()?? {
            gimli::AttributeValue::UnitRef(offset) => Some(offset),
            _ => None,
        }
    }

    /// データメンバのロケーション（オフセット）を取得する
    fn get_data_member_location(
        &self,
        entry: &gimli::DebuggingInformationEntry<DwarfReader>,
    ) -> Option<u64> {
        entry.attr_value(gimli::DW_AT_data_member_location).ok()??.udata_value()
    }
}
