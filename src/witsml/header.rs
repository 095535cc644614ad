use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered mnemonic → unit mapping taken from a log's header lists.
///
/// Keys are unique. Inserting an existing mnemonic keeps its original position
/// and replaces the unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MnemonicMap {
    entries: Vec<(String, String)>,
}

impl MnemonicMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits both header lists on `,` and pairs them by position. Pairing
    /// stops at the end of the shorter list.
    pub fn from_lists(mnemonic_list: &str, unit_list: &str) -> Self {
        let mut map = Self::new();
        for (mnemonic, unit) in mnemonic_list.split(',').zip(unit_list.split(',')) {
            map.insert(mnemonic, unit);
        }
        map
    }

    pub fn insert<M: Into<String>, U: Into<String>>(&mut self, mnemonic: M, unit: U) {
        let mnemonic = mnemonic.into();
        let unit = unit.into();

        match self.entries.iter_mut().find(|(m, _)| *m == mnemonic) {
            Some(entry) => entry.1 = unit,
            None => self.entries.push((mnemonic, unit)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unit(&self, mnemonic: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(m, _)| m == mnemonic)
            .map(|(_, u)| u.as_str())
    }

    pub fn mnemonics(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(m, _)| m.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(m, u)| (m.as_str(), u.as_str()))
    }
}

impl Serialize for MnemonicMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (mnemonic, unit) in &self.entries {
            map.serialize_entry(mnemonic, unit)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lists_preserves_order() {
        let map = MnemonicMap::from_lists("DEPT,GR,RHOB", "m,API,g/cm3");

        assert_eq!(map.len(), 3);
        assert_eq!(map.mnemonics().collect::<Vec<_>>(), vec!["DEPT", "GR", "RHOB"]);
        assert_eq!(map.unit("RHOB"), Some("g/cm3"));
    }

    #[test]
    fn test_from_lists_stops_at_shorter_list() {
        let map = MnemonicMap::from_lists("DEPT,GR,RHOB", "m,API");
        assert_eq!(map.len(), 2);
        assert_eq!(map.unit("RHOB"), None);
    }

    #[test]
    fn test_duplicate_mnemonic_keeps_position_and_last_unit() {
        let map = MnemonicMap::from_lists("DEPT,GR,DEPT", "m,API,ft");

        assert_eq!(map.mnemonics().collect::<Vec<_>>(), vec!["DEPT", "GR"]);
        assert_eq!(map.unit("DEPT"), Some("ft"));
    }

    #[test]
    fn test_empty_lists_yield_one_blank_entry() {
        let map = MnemonicMap::from_lists("", "");
        assert_eq!(map.len(), 1);
        assert_eq!(map.unit(""), Some(""));
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let map = MnemonicMap::from_lists("TIME,DEPT", "s,m");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"TIME":"s","DEPT":"m"}"#);
    }
}
