//! Standard poster sizes.
//!
//! Each ratio group has a portrait and a landscape variant at 300 DPI print
//! resolution; landscape pixels are the portrait pixels transposed. Only one
//! orientation is exported per run; by default the one matching the source
//! photo.
//!
//! | Group | Portrait | Landscape | Pixels (portrait) |
//! |---|---|---|---|
//! | `2x3` | 24″ × 36″ | 36″ × 24″ | 7200 × 10800 |
//! | `ISO_A1` | 594 × 841 mm | 841 × 594 mm | 7016 × 9933 |
//! | `4x5` | 24″ × 30″ | 30″ × 24″ | 7200 × 9000 |
//! | `3x4` | 24″ × 32″ | 32″ × 24″ | 7200 × 9600 |
//! | `11x14` | 22″ × 28″ | 28″ × 22″ | 6600 × 8400 |

use crate::config::TargetSettings;
use crate::types::{Size, TargetSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Orientation of a photo: square counts as landscape.
    pub fn of(size: Size) -> Self {
        if size.is_landscape() {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        })
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!(
                "unknown orientation '{other}' (expected portrait or landscape)"
            )),
        }
    }
}

/// One orientation of a ratio group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetSize {
    /// e.g. `"4:5 Portrait"`
    pub label: &'static str,
    /// e.g. `"24x30_portrait"`
    pub filename_tag: &'static str,
    /// Physical print size, e.g. `"24″ × 30″"`
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl PresetSize {
    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }
}

/// A base ratio with both orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioGroup {
    pub id: &'static str,
    /// e.g. `"4 : 5"`
    pub group_label: &'static str,
    pub portrait: PresetSize,
    pub landscape: PresetSize,
}

impl RatioGroup {
    pub fn size_for(&self, orientation: Orientation) -> &PresetSize {
        match orientation {
            Orientation::Portrait => &self.portrait,
            Orientation::Landscape => &self.landscape,
        }
    }

    /// Build an export target for this group.
    pub fn target(&self, orientation: Orientation, settings: &TargetSettings) -> TargetSpec {
        let preset = self.size_for(orientation);
        TargetSpec {
            id: self.id.to_string(),
            label: preset.label.to_string(),
            filename_tag: preset.filename_tag.to_string(),
            size: preset.size(),
            mode: settings.mode,
            mat_percent: settings.mat_percent,
            background: settings.background,
        }
    }
}

pub const RATIO_GROUPS: &[RatioGroup] = &[
    RatioGroup {
        id: "2x3",
        group_label: "2 : 3",
        portrait: PresetSize {
            label: "2:3 Portrait",
            filename_tag: "24x36_portrait",
            name: "24″ × 36″",
            width: 7200,
            height: 10800,
        },
        landscape: PresetSize {
            label: "2:3 Landscape",
            filename_tag: "36x24_landscape",
            name: "36″ × 24″",
            width: 10800,
            height: 7200,
        },
    },
    RatioGroup {
        id: "ISO_A1",
        group_label: "ISO A1",
        portrait: PresetSize {
            label: "A1 Portrait",
            filename_tag: "A1_portrait",
            name: "A1 (594 × 841 mm)",
            width: 7016,
            height: 9933,
        },
        landscape: PresetSize {
            label: "A1 Landscape",
            filename_tag: "A1_landscape",
            name: "A1 (841 × 594 mm)",
            width: 9933,
            height: 7016,
        },
    },
    RatioGroup {
        id: "4x5",
        group_label: "4 : 5",
        portrait: PresetSize {
            label: "4:5 Portrait",
            filename_tag: "24x30_portrait",
            name: "24″ × 30″",
            width: 7200,
            height: 9000,
        },
        landscape: PresetSize {
            label: "4:5 Landscape",
            filename_tag: "30x24_landscape",
            name: "30″ × 24″",
            width: 9000,
            height: 7200,
        },
    },
    RatioGroup {
        id: "3x4",
        group_label: "3 : 4",
        portrait: PresetSize {
            label: "3:4 Portrait",
            filename_tag: "24x32_portrait",
            name: "24″ × 32″",
            width: 7200,
            height: 9600,
        },
        landscape: PresetSize {
            label: "3:4 Landscape",
            filename_tag: "32x24_landscape",
            name: "32″ × 24″",
            width: 9600,
            height: 7200,
        },
    },
    RatioGroup {
        id: "11x14",
        group_label: "11 : 14",
        portrait: PresetSize {
            label: "11:14 Portrait",
            filename_tag: "22x28_portrait",
            name: "22″ × 28″",
            width: 6600,
            height: 8400,
        },
        landscape: PresetSize {
            label: "11:14 Landscape",
            filename_tag: "28x22_landscape",
            name: "28″ × 22″",
            width: 8400,
            height: 6600,
        },
    },
];

/// Look up a ratio group by id (case-insensitive).
pub fn find_group(id: &str) -> Option<&'static RatioGroup> {
    RATIO_GROUPS.iter().find(|g| g.id.eq_ignore_ascii_case(id))
}

/// Resolve group ids to groups, preserving the given order.
///
/// An empty list selects every group. Unknown ids are an error naming the
/// valid choices.
pub fn select_groups(ids: &[String]) -> Result<Vec<&'static RatioGroup>, String> {
    if ids.is_empty() {
        return Ok(RATIO_GROUPS.iter().collect());
    }
    ids.iter()
        .map(|id| {
            find_group(id).ok_or_else(|| {
                let known: Vec<&str> = RATIO_GROUPS.iter().map(|g| g.id).collect();
                format!("unknown ratio '{id}'. Available: {}", known.join(", "))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LayoutMode, Rgb};

    #[test]
    fn landscape_is_portrait_transposed() {
        for group in RATIO_GROUPS {
            assert_eq!(group.portrait.width, group.landscape.height, "{}", group.id);
            assert_eq!(group.portrait.height, group.landscape.width, "{}", group.id);
            assert!(group.portrait.width < group.portrait.height);
        }
    }

    #[test]
    fn group_ids_are_unique() {
        let mut ids: Vec<&str> = RATIO_GROUPS.iter().map(|g| g.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), RATIO_GROUPS.len());
    }

    #[test]
    fn orientation_of_source() {
        assert_eq!(Orientation::of(Size::new(4000, 3000).unwrap()), Orientation::Landscape);
        assert_eq!(Orientation::of(Size::new(3000, 3000).unwrap()), Orientation::Landscape);
        assert_eq!(Orientation::of(Size::new(3000, 4000).unwrap()), Orientation::Portrait);
    }

    #[test]
    fn find_group_is_case_insensitive() {
        assert_eq!(find_group("iso_a1").unwrap().id, "ISO_A1");
        assert!(find_group("5x7").is_none());
    }

    #[test]
    fn select_groups_keeps_requested_order() {
        let groups = select_groups(&["4x5".into(), "2x3".into()]).unwrap();
        let ids: Vec<&str> = groups.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["4x5", "2x3"]);
    }

    #[test]
    fn select_groups_empty_means_all() {
        assert_eq!(select_groups(&[]).unwrap().len(), RATIO_GROUPS.len());
    }

    #[test]
    fn select_groups_unknown_lists_choices() {
        let err = select_groups(&["5x7".into()]).unwrap_err();
        assert!(err.contains("5x7"));
        assert!(err.contains("11x14"));
    }

    #[test]
    fn target_carries_preset_and_settings() {
        let settings = TargetSettings {
            mode: LayoutMode::Mat,
            mat_percent: 8,
            background: Rgb::WHITE,
        };
        let t = find_group("4x5")
            .unwrap()
            .target(Orientation::Portrait, &settings);
        assert_eq!(t.id, "4x5");
        assert_eq!(t.label, "4:5 Portrait");
        assert_eq!(t.filename_tag, "24x30_portrait");
        assert_eq!(t.size, Size::new(7200, 9000).unwrap());
        assert_eq!(t.mode, LayoutMode::Mat);
        assert_eq!(t.mat_percent, 8);
        assert_eq!(t.background, Rgb::WHITE);
    }
}
