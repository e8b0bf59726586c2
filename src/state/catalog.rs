/// Static costume catalog and on-the-fly custom costumes

use chrono::Utc;

use super::data::{Costume, CostumeCategory, ImageData, Thumbnail};
use super::ids::SessionIds;

/// Fallback name when a custom costume's filename has no usable stem
pub const DEFAULT_CUSTOM_NAME: &str = "Custom Costume";

// (id, name, category, picsum seed)
const ENTRIES: [(&str, &str, CostumeCategory, &str); 20] = [
    ("c1", "Naruto Ninja", CostumeCategory::Anime, "naruto"),
    ("c2", "Demon Slayer Corps", CostumeCategory::Anime, "demonslayer"),
    ("c3", "Attack on Titan Gear", CostumeCategory::Anime, "aot"),
    ("c4", "Goku Gi", CostumeCategory::Anime, "goku"),
    ("c5", "Sailor Moon Uniform", CostumeCategory::Anime, "sailormoon"),
    ("c6", "Master Chief", CostumeCategory::Gaming, "masterchief"),
    ("c7", "Link from Zelda", CostumeCategory::Gaming, "link"),
    ("c8", "Witcher Armor", CostumeCategory::Gaming, "witcher"),
    ("c9", "Kratos War Paint", CostumeCategory::Gaming, "kratos"),
    ("c10", "Ezio Auditore", CostumeCategory::Gaming, "ezio"),
    ("c11", "Stormtrooper", CostumeCategory::Movies, "stormtrooper"),
    ("c12", "Batman Suit", CostumeCategory::Movies, "batman"),
    ("c13", "Wonder Woman", CostumeCategory::Movies, "wonderwoman"),
    ("c14", "Spider-Man Suit", CostumeCategory::Movies, "spiderman"),
    ("c15", "Jedi Knight", CostumeCategory::Movies, "jedi"),
    ("c16", "Medieval Knight", CostumeCategory::Fantasy, "knight"),
    ("c17", "Wizard Robes", CostumeCategory::Fantasy, "wizard"),
    ("c18", "Vampire Gothic", CostumeCategory::Fantasy, "vampire"),
    ("c19", "Elven Archer", CostumeCategory::Fantasy, "elf"),
    ("c20", "Dwarven Warrior", CostumeCategory::Fantasy, "dwarf"),
];

/// All predefined costumes, in display order
pub fn catalog() -> Vec<Costume> {
    ENTRIES
        .iter()
        .map(|(id, name, category, seed)| Costume {
            id: id.to_string(),
            name: name.to_string(),
            category: *category,
            thumbnail: Thumbnail::Remote(format!("https://picsum.photos/seed/{}/400/600", seed)),
        })
        .collect()
}

/// Catalog costumes of one category, preserving catalog order
pub fn by_category(category: CostumeCategory) -> Vec<Costume> {
    catalog()
        .into_iter()
        .filter(|costume| costume.category == category)
        .collect()
}

/// Look up a catalog costume by id
pub fn find(id: &str) -> Option<Costume> {
    catalog().into_iter().find(|costume| costume.id == id)
}

/// Display name for a custom costume: the filename minus its last extension
pub fn custom_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _extension)) => stem,
        None => "",
    };

    if stem.is_empty() {
        DEFAULT_CUSTOM_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// Turn an uploaded reference image into a selectable costume
pub fn custom_costume(file_name: &str, image: ImageData, ids: &mut SessionIds) -> Costume {
    Costume {
        id: ids.costume(CostumeCategory::Custom, Utc::now()),
        name: custom_name(file_name),
        category: CostumeCategory::Custom,
        thumbnail: Thumbnail::Embedded(image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::fixtures;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique() {
        let costumes = catalog();
        let ids: HashSet<_> = costumes.iter().map(|c| c.id.clone()).collect();
        assert_eq!(costumes.len(), 20);
        assert_eq!(ids.len(), 20);
        assert!(costumes.iter().all(|c| !c.is_custom()));
    }

    #[test]
    fn test_by_category_keeps_order() {
        let anime = by_category(CostumeCategory::Anime);
        let names: Vec<_> = anime.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            ["Naruto Ninja", "Demon Slayer Corps", "Attack on Titan Gear", "Goku Gi", "Sailor Moon Uniform"]
        );
        assert!(by_category(CostumeCategory::Custom).is_empty());
    }

    #[test]
    fn test_find() {
        assert_eq!(find("c12").map(|c| c.name), Some("Batman Suit".to_string()));
        assert!(find("c99").is_none());
    }

    #[test]
    fn test_custom_name_strips_last_extension() {
        assert_eq!(custom_name("geralt.png"), "geralt");
        assert_eq!(custom_name("my.hero.suit.jpeg"), "my.hero.suit");
        assert_eq!(custom_name("noextension"), DEFAULT_CUSTOM_NAME);
        assert_eq!(custom_name(".png"), DEFAULT_CUSTOM_NAME);
        assert_eq!(custom_name(""), DEFAULT_CUSTOM_NAME);
    }

    #[test]
    fn test_custom_costume_record() {
        let mut ids = SessionIds::default();
        let image = fixtures::image(90);

        let first = custom_costume("armor.png", image.clone(), &mut ids);
        let second = custom_costume("armor.png", image.clone(), &mut ids);

        assert_eq!(first.category, CostumeCategory::Custom);
        assert_eq!(first.name, "armor");
        assert_eq!(first.reference_image(), Some(&image));
        assert!(first.id.starts_with("custom-"));
        assert_ne!(first.id, second.id);
    }
}
