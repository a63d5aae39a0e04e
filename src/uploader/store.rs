//! # 暂存列表模块
//!
//! ## 设计思路
//!
//! `ItemStore` 持有有序且 key 唯一的条目列表。所有操作都是纯函数式的：接收当前列表，返回新列表，
//! 不产生任何隐藏副作用，方便协调器“一次运行结果整体写入”。
//! 数量上限由调用方（协调器）负责，Store 本身不做 `max_number` 检查。

use super::source::{PublicItem, UploadItem, to_public_list};

/// 有序、key 唯一的暂存列表。
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<UploadItem>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由已有条目构建，重复 key 只保留第一次出现的条目。
    pub fn from_items(items: Vec<UploadItem>) -> Self {
        let mut unique: Vec<UploadItem> = Vec::with_capacity(items.len());
        for item in items {
            if unique.iter().any(|existing| existing.key == item.key) {
                log::warn!("⚠️ 丢弃重复 key 的条目：{}", item.key);
                continue;
            }
            unique.push(item);
        }
        Self { items: unique }
    }

    /// 返回 `当前列表 ++ new_items`。
    pub fn append(&self, new_items: Vec<UploadItem>) -> Self {
        let mut items = Vec::with_capacity(self.items.len() + new_items.len());
        items.extend(self.items.iter().cloned());
        items.extend(new_items);
        Self { items }
    }

    /// 用 `item` 整体替换 key 匹配的条目并保持位置；没有匹配时列表不变。
    pub fn replace_by_key(&self, key: &str, item: UploadItem) -> Self {
        let mut replacement = Some(item);
        let items = self
            .items
            .iter()
            .map(|existing| {
                if existing.key == key {
                    if let Some(new_item) = replacement.take() {
                        return new_item;
                    }
                }
                existing.clone()
            })
            .collect();
        Self { items }
    }

    /// 去掉 key 匹配的条目，其余条目保持相对顺序。
    pub fn remove_by_key(&self, key: &str) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|item| item.key != key)
                .cloned()
                .collect(),
        }
    }

    pub fn clear(&self) -> Self {
        Self::new()
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|item| item.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.key.as_str()).collect()
    }

    /// 对外发布的列表形态。
    pub fn to_public(&self) -> Vec<PublicItem> {
        to_public_list(&self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str) -> UploadItem {
        UploadItem {
            key: key.to_string(),
            data_url: format!("data:image/png;base64,{}", key),
            file: None,
        }
    }

    fn store(keys: &[&str]) -> ItemStore {
        ItemStore::from_items(keys.iter().map(|key| item(key)).collect())
    }

    #[test]
    fn append_concatenates_in_order() {
        let appended = store(&["a", "b"]).append(vec![item("c"), item("d")]);
        assert_eq!(appended.keys(), ["a", "b", "c", "d"]);
    }

    #[test]
    fn replace_keeps_position_and_length() {
        let original = store(&["a", "b", "c"]);
        let replaced = original.replace_by_key("b", item("x"));

        assert_eq!(replaced.keys(), ["a", "x", "c"]);
        assert_eq!(original.keys(), ["a", "b", "c"]);
    }

    #[test]
    fn replace_unknown_key_is_noop() {
        let replaced = store(&["a", "b"]).replace_by_key("zzz", item("x"));
        assert_eq!(replaced.keys(), ["a", "b"]);
    }

    #[test]
    fn remove_drops_only_matching_key() {
        let removed = store(&["a", "b", "c"]).remove_by_key("b");
        assert_eq!(removed.keys(), ["a", "c"]);

        let untouched = store(&["a", "b"]).remove_by_key("missing");
        assert_eq!(untouched.keys(), ["a", "b"]);
    }

    #[test]
    fn clear_returns_empty_store() {
        assert!(store(&["a"]).clear().is_empty());
    }

    #[test]
    fn from_items_drops_duplicate_keys() {
        let deduped = store(&["a", "b", "a"]);
        assert_eq!(deduped.keys(), ["a", "b"]);
        assert!(deduped.contains_key("b"));
    }
}
