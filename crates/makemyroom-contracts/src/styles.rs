use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignStyle {
    pub id: String,
    pub name: String,
    pub prompt: String,
    pub thumbnail: String,
}

/// Read-only catalog of decor styles, kept in display order.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    styles: IndexMap<String, DesignStyle>,
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new(None)
    }
}

impl StyleCatalog {
    pub fn new(styles: Option<IndexMap<String, DesignStyle>>) -> Self {
        Self {
            styles: styles.unwrap_or_else(default_styles),
        }
    }

    pub fn get(&self, id: &str) -> Option<&DesignStyle> {
        self.styles.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &DesignStyle> {
        self.styles.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.styles.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

fn default_styles() -> IndexMap<String, DesignStyle> {
    let mut map = IndexMap::new();

    let mut insert = |id: &str, name: &str, prompt: &str, thumbnail_id: u32| {
        map.insert(
            id.to_string(),
            DesignStyle {
                id: id.to_string(),
                name: name.to_string(),
                prompt: prompt.to_string(),
                thumbnail: format!("https://picsum.photos/id/{thumbnail_id}/100/100"),
            },
        );
    };

    insert(
        "mid-century",
        "Mid-Century Modern",
        "Interior design in Mid-Century Modern style, teak wood, organic curves, clean lines, muted tones, high quality photorealistic",
        10,
    );
    insert(
        "scandinavian",
        "Scandinavian",
        "Interior design in Scandinavian style, bright, airy, minimalism, white walls, light wood, cozy textures, high quality photorealistic",
        20,
    );
    insert(
        "industrial",
        "Industrial",
        "Interior design in Industrial style, exposed brick, metal accents, raw materials, loft aesthetic, high quality photorealistic",
        30,
    );
    insert(
        "bohemian",
        "Bohemian",
        "Interior design in Bohemian style, eclectic patterns, plants, rattan, warm colors, layered textiles, high quality photorealistic",
        40,
    );
    insert(
        "cyberpunk",
        "Cyberpunk",
        "Interior design in Cyberpunk style, neon lights, futuristic furniture, dark tones, high tech aesthetic, high quality photorealistic",
        50,
    );

    map
}
