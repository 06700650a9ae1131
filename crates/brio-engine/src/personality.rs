//! Play-style personalities: named parameter bundles that bias depth,
//! time allocation, and evaluation without touching the search algorithm.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::search::MAX_PLY;

/// Failure to load a personality catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read style file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse style file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An immutable parameter bundle selected once per search request.
///
/// All behavior differences between styles are carried by these fields;
/// nothing in the engine switches on the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personality {
    /// Display name; also the `setoption` value that selects this style.
    pub name: String,
    /// Depth cap applied when the caller does not pin a depth explicitly.
    pub max_depth: u8,
    /// Score (centipawns, mover's perspective) below which panic may trigger.
    pub panic_threshold: i32,
    /// Probability of the panic time override once the threshold is met.
    pub panic_probability: f64,
    /// Material weight; below 1.0 each side's material counts for less,
    /// which favors sacrificial play.
    pub material_weight: f64,
    /// Centipawns per attacked square in the enemy king's zone.
    pub king_attack_bonus: i32,
    /// Consecutive quiet (non-capturing, non-checking) moves tolerated
    /// before a sacrifice is forced; 0 disables the mechanism.
    pub boredom_limit: u32,
    /// Whether the opening book should prefer gambit lines.
    pub prefers_gambits: bool,
}

impl Default for Personality {
    /// The "Normal" style: unweighted classical search to full depth.
    fn default() -> Personality {
        Personality {
            name: "Normal".to_string(),
            max_depth: MAX_PLY as u8,
            panic_threshold: -10_000,
            panic_probability: 0.0,
            material_weight: 1.0,
            king_attack_bonus: 0,
            boredom_limit: 0,
            prefers_gambits: false,
        }
    }
}

impl Personality {
    /// Whether this style modulates static evaluation at all.
    pub fn shapes_evaluation(&self) -> bool {
        (self.material_weight - 1.0).abs() > f64::EPSILON || self.king_attack_bonus != 0
    }

    /// Whether this style may enter panic mode.
    pub fn panics(&self) -> bool {
        self.panic_probability > 0.0
    }
}

/// The built-in and file-loaded styles, looked up by name.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Keyed by normalized (lowercased, underscore-free) name.
    styles: HashMap<String, Personality>,
}

/// GUIs send option values with underscores for spaces; fold both along
/// with case so "the_gambiteer" finds "The Gambiteer".
fn normalize(name: &str) -> String {
    name.replace('_', " ").to_lowercase()
}

impl Catalog {
    /// The four built-in styles.
    pub fn builtin() -> Catalog {
        let styles = [
            Personality::default(),
            Personality {
                name: "Gambiteer".to_string(),
                material_weight: 0.8,
                king_attack_bonus: 12,
                boredom_limit: 10,
                prefers_gambits: true,
                ..Personality::default()
            },
            Personality {
                name: "Desperado".to_string(),
                panic_threshold: -150,
                panic_probability: 0.35,
                ..Personality::default()
            },
            Personality {
                name: "Easy".to_string(),
                max_depth: 3,
                ..Personality::default()
            },
        ];
        Catalog {
            styles: styles
                .into_iter()
                .map(|p| (normalize(&p.name), p))
                .collect(),
        }
    }

    /// Load styles from a JSON file and merge them over the built-ins.
    ///
    /// The file maps style names to personality records; the map key wins
    /// over any `name` field inside the record.
    pub fn load(path: &Path) -> Result<Catalog, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        let loaded: HashMap<String, Personality> = serde_json::from_str(&json)?;
        let mut catalog = Catalog::builtin();
        for (name, mut personality) in loaded {
            personality.name = name.clone();
            catalog.styles.insert(normalize(&name), personality);
        }
        Ok(catalog)
    }

    /// Load from `path` if it exists; fall back to the built-ins on any
    /// trouble, with a log line instead of an error.
    pub fn load_or_builtin(path: &Path) -> Catalog {
        if !path.exists() {
            return Catalog::builtin();
        }
        match Catalog::load(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "style file rejected, using built-ins");
                Catalog::builtin()
            }
        }
    }

    /// Look up a style by name; unknown names fall back to Normal.
    pub fn get(&self, name: &str) -> Personality {
        self.styles
            .get(&normalize(name))
            .cloned()
            .unwrap_or_default()
    }

    /// Style names in sorted order, for the UCI combo option.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.styles.values().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_classical() {
        let normal = Personality::default();
        assert!(!normal.shapes_evaluation());
        assert!(!normal.panics());
        assert_eq!(normal.boredom_limit, 0);
        assert_eq!(normal.max_depth, MAX_PLY as u8);
    }

    #[test]
    fn builtin_lookup_is_case_and_underscore_insensitive() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.get("gambiteer").name, "Gambiteer");
        assert_eq!(catalog.get("GAMBITEER").name, "Gambiteer");
        assert_eq!(catalog.get("Desperado").name, "Desperado");
    }

    #[test]
    fn unknown_style_falls_back_to_normal() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.get("does not exist").name, "Normal");
    }

    #[test]
    fn gambiteer_shapes_evaluation() {
        let catalog = Catalog::builtin();
        assert!(catalog.get("Gambiteer").shapes_evaluation());
        assert!(catalog.get("Desperado").panics());
        assert!(!catalog.get("Easy").shapes_evaluation());
    }

    #[test]
    fn file_styles_merge_over_builtins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"Berserker": {{"material_weight": 0.5, "king_attack_bonus": 25}},
                "Easy": {{"max_depth": 2}}}}"#
        )
        .unwrap();
        let catalog = Catalog::load(file.path()).unwrap();

        let berserker = catalog.get("Berserker");
        assert_eq!(berserker.name, "Berserker");
        assert_eq!(berserker.king_attack_bonus, 25);
        // Unspecified fields take defaults.
        assert_eq!(berserker.max_depth, MAX_PLY as u8);
        // File entry overrides the built-in of the same name.
        assert_eq!(catalog.get("Easy").max_depth, 2);
        // Untouched built-ins survive.
        assert_eq!(catalog.get("Gambiteer").boredom_limit, 10);
    }

    #[test]
    fn broken_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let catalog = Catalog::load_or_builtin(file.path());
        assert_eq!(catalog.get("Normal").name, "Normal");
    }

    #[test]
    fn names_are_sorted() {
        let names = Catalog::builtin().names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"Normal".to_string()));
    }
}
