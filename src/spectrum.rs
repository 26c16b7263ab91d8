//! Built-in spectrum packs and per-round spectrum selection

use crate::types::{Spectrum, SpectrumId};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::VecDeque;

pub const DEFAULT_PACK: &str = "default";

struct SpectrumDef {
    id: &'static str,
    left: &'static str,
    right: &'static str,
    banned: &'static [&'static str],
}

const DEFAULT: &[SpectrumDef] = &[
    SpectrumDef {
        id: "ancient_futuristic_01",
        left: "Ancient",
        right: "Futuristic",
        banned: &["ancient", "futuristic", "old", "new", "past", "future", "modern"],
    },
    SpectrumDef {
        id: "quiet_loud_01",
        left: "Quiet",
        right: "Loud",
        banned: &["quiet", "loud", "silent", "noisy", "noise", "sound"],
    },
    SpectrumDef {
        id: "niche_mainstream_01",
        left: "Niche",
        right: "Mainstream",
        banned: &["niche", "mainstream", "popular", "unpopular", "obscure"],
    },
    SpectrumDef {
        id: "plain_fancy_01",
        left: "Plain",
        right: "Fancy",
        banned: &["plain", "fancy", "simple", "elaborate", "basic", "elegant"],
    },
    SpectrumDef {
        id: "light_heavy_01",
        left: "Light",
        right: "Heavy",
        banned: &["light", "heavy", "meal"],
    },
    SpectrumDef {
        id: "silly_serious_01",
        left: "Silly",
        right: "Serious",
        banned: &["silly", "serious", "funny", "solemn"],
    },
    SpectrumDef {
        id: "homemade_storebought_01",
        left: "Homemade",
        right: "Store-Bought",
        banned: &["homemade", "store", "bought", "shop", "market"],
    },
    SpectrumDef {
        id: "spicy_mild_01",
        left: "Spicy",
        right: "Mild",
        banned: &["spicy", "mild", "hot", "cold", "heat", "spice"],
    },
    SpectrumDef {
        id: "fast_slow_01",
        left: "Fast",
        right: "Slow",
        banned: &["fast", "slow", "quick", "sluggish", "speed"],
    },
    SpectrumDef {
        id: "cheap_expensive_01",
        left: "Cheap",
        right: "Expensive",
        banned: &["cheap", "expensive", "costly", "affordable", "price"],
    },
];

const FAMILY: &[SpectrumDef] = &[
    SpectrumDef {
        id: "big_small_01",
        left: "Big",
        right: "Small",
        banned: &["big", "small", "large", "tiny", "huge", "little"],
    },
    SpectrumDef {
        id: "fast_slow_family_01",
        left: "Fast",
        right: "Slow",
        banned: &["fast", "slow", "quick", "sluggish"],
    },
    SpectrumDef {
        id: "sweet_sour_01",
        left: "Sweet",
        right: "Sour",
        banned: &["sweet", "sour", "sugar", "tart"],
    },
    SpectrumDef {
        id: "day_night_01",
        left: "Day Vibes",
        right: "Night Vibes",
        banned: &["day", "night", "morning", "evening"],
    },
    SpectrumDef {
        id: "scary_safe_01",
        left: "Scary",
        right: "Safe",
        banned: &["scary", "safe", "danger", "secure", "frightening"],
    },
    SpectrumDef {
        id: "messy_neat_01",
        left: "Messy",
        right: "Neat",
        banned: &["messy", "neat", "clean", "dirty", "tidy"],
    },
    SpectrumDef {
        id: "soft_hard_01",
        left: "Soft",
        right: "Hard",
        banned: &["soft", "hard", "firm", "squishy"],
    },
    SpectrumDef {
        id: "hot_cold_01",
        left: "Hot",
        right: "Cold",
        banned: &["hot", "cold", "warm", "cool", "freezing", "boiling"],
    },
];

const PARTY: &[SpectrumDef] = &[
    SpectrumDef {
        id: "meme_graveyard_fresh_01",
        left: "Meme Graveyard",
        right: "Fresh Meme",
        banned: &["meme", "old", "new", "dead", "fresh"],
    },
    SpectrumDef {
        id: "introvert_extrovert_01",
        left: "Introvert Energy",
        right: "Extrovert Energy",
        banned: &["introvert", "extrovert", "shy", "outgoing"],
    },
    SpectrumDef {
        id: "cozy_outout_01",
        left: "Cozy Night In",
        right: "Out-Out",
        banned: &["cozy", "out", "home", "party", "club"],
    },
    SpectrumDef {
        id: "cringe_based_01",
        left: "Cringe",
        right: "Based",
        banned: &["cringe", "based", "cool", "awkward"],
    },
    SpectrumDef {
        id: "basic_unique_01",
        left: "Basic",
        right: "Unique",
        banned: &["basic", "unique", "different", "common"],
    },
    SpectrumDef {
        id: "chaotic_organized_01",
        left: "Chaotic",
        right: "Organized",
        banned: &["chaotic", "organized", "chaos", "order"],
    },
    SpectrumDef {
        id: "lowkey_extra_01",
        left: "Lowkey",
        right: "Extra",
        banned: &["lowkey", "extra", "dramatic", "chill"],
    },
];

const PACKS: &[(&str, &[SpectrumDef])] = &[(DEFAULT_PACK, DEFAULT), ("family", FAMILY), ("party", PARTY)];

impl From<&SpectrumDef> for Spectrum {
    fn from(def: &SpectrumDef) -> Self {
        Self {
            id: def.id.to_string(),
            left: def.left.to_string(),
            right: def.right.to_string(),
            banned: def.banned.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Names of all built-in packs
pub fn pack_names() -> Vec<&'static str> {
    PACKS.iter().map(|(name, _)| *name).collect()
}

pub fn is_known_pack(name: &str) -> bool {
    PACKS.iter().any(|(pack, _)| *pack == name)
}

fn pack(name: &str) -> &'static [SpectrumDef] {
    PACKS
        .iter()
        .find(|(pack, _)| *pack == name)
        .map(|(_, defs)| *defs)
        .unwrap_or(DEFAULT)
}

/// All spectrums of a pack; unknown names fall back to the default pack
#[cfg(test)]
pub fn spectrums(pack_name: &str) -> Vec<Spectrum> {
    pack(pack_name).iter().map(Spectrum::from).collect()
}

/// Pick a spectrum from `pack_name` that is not among the recently used ids.
/// When every spectrum of the pack was used recently, the whole pack is eligible.
pub fn pick_spectrum<R: Rng + ?Sized>(
    pack_name: &str,
    recent: &VecDeque<SpectrumId>,
    rng: &mut R,
) -> Spectrum {
    let defs = pack(pack_name);
    let fresh: Vec<&SpectrumDef> = defs
        .iter()
        .filter(|def| !recent.iter().any(|id| id == def.id))
        .collect();

    let chosen = if fresh.is_empty() {
        defs.choose(rng)
    } else {
        fresh.choose(rng).copied()
    };

    // Packs are non-empty constants
    chosen.map(Spectrum::from).unwrap_or_else(|| Spectrum::from(&DEFAULT[0]))
}

/// Push a used spectrum id, evicting the oldest beyond the history limit
pub fn remember(recent: &mut VecDeque<SpectrumId>, id: SpectrumId, limit: usize) {
    recent.push_back(id);
    while recent.len() > limit {
        recent.pop_front();
    }
}
