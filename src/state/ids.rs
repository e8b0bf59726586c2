/// Session-scoped id generation
///
/// Wall-clock strings alone collide when two ids are minted inside the same
/// millisecond, so every id also carries a monotonically increasing sequence.

use chrono::{DateTime, Utc};

use super::data::CostumeCategory;

#[derive(Debug, Default)]
pub struct SessionIds {
    next: u64,
}

impl SessionIds {
    fn bump(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Id for a transformation record created at `now`
    pub fn transformation(&mut self, now: DateTime<Utc>) -> String {
        let seq = self.bump();
        format!("{}-{}", now.format("%Y%m%dT%H%M%S%.3f"), seq)
    }

    /// Id for a costume built on the fly, e.g. `custom-1718000000000-3`
    pub fn costume(&mut self, category: CostumeCategory, now: DateTime<Utc>) -> String {
        let seq = self.bump();
        format!("{}-{}-{}", category.tag(), now.timestamp_millis(), seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_unique_within_same_instant() {
        let mut ids = SessionIds::default();
        let now = Utc::now();

        let generated: HashSet<String> = (0..100).map(|_| ids.transformation(now)).collect();
        assert_eq!(generated.len(), 100);
    }

    #[test]
    fn test_costume_id_carries_category_tag() {
        let mut ids = SessionIds::default();
        let id = ids.costume(CostumeCategory::Custom, Utc::now());
        assert!(id.starts_with("custom-"));
    }
}
