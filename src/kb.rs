//! Knowledge Base
//!
//! Static, read-only mapping from normalized `(crop, disease)` pairs to
//! tiered control actions. The table is built once at startup, either from
//! the embedded seed data or from an operator-supplied JSON file, and never
//! mutated afterwards; sharing it behind `Arc` is lock-free.
//!
//! Every entry carries all three tier slots. A tier with no known actions is
//! an empty vector, never an absent key, so callers need no existence checks
//! beyond crop/disease presence.

use crate::error::RecommenderError;
use anyhow::{Context, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Control tier, in escalation order: cultural → biological → chemical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlTier {
    Cultural,
    Biological,
    Chemical,
}

impl ControlTier {
    /// All tiers in presentation order
    pub const ALL: [ControlTier; 3] = [
        ControlTier::Cultural,
        ControlTier::Biological,
        ControlTier::Chemical,
    ];

    pub fn display_text(&self) -> &'static str {
        match self {
            ControlTier::Cultural => "cultural",
            ControlTier::Biological => "biological",
            ControlTier::Chemical => "chemical",
        }
    }
}

/// A single control action, sourced verbatim from the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAction {
    pub tier: ControlTier,
    pub id: String,
    pub description: String,

    /// Dosage note, mainly for chemical and biological formulations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
}

/// Candidate actions for one `(crop, disease)` pair with guaranteed tier slots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieredActions {
    pub cultural: Vec<ControlAction>,
    pub biological: Vec<ControlAction>,
    pub chemical: Vec<ControlAction>,
}

impl TieredActions {
    /// Actions for one tier, in knowledge-base insertion order
    pub fn tier(&self, tier: ControlTier) -> &[ControlAction] {
        match tier {
            ControlTier::Cultural => &self.cultural,
            ControlTier::Biological => &self.biological,
            ControlTier::Chemical => &self.chemical,
        }
    }

    fn slot_mut(&mut self, tier: ControlTier) -> &mut Vec<ControlAction> {
        match tier {
            ControlTier::Cultural => &mut self.cultural,
            ControlTier::Biological => &mut self.biological,
            ControlTier::Chemical => &mut self.chemical,
        }
    }
}

/// Normalize a crop or disease key: trimmed and lower-cased
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Immutable crop → disease → tiered actions table
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: FxHashMap<(String, String), TieredActions>,
    crops: FxHashSet<String>,
}

impl KnowledgeBase {
    /// Build the knowledge base from the embedded seed table
    pub fn builtin() -> Self {
        let mut kb = KnowledgeBase::default();

        for seed in BUILTIN_ACTIONS {
            kb.insert_action(
                seed.crop,
                seed.disease,
                ControlAction {
                    tier: seed.tier,
                    id: seed.id.to_string(),
                    description: seed.description.to_string(),
                    dosage: seed.dosage.map(str::to_string),
                },
            );
        }

        // Disease entries with no actions in one tier still get the slot
        // (TieredActions::default covers that), but crops listed without any
        // seed row would be unreachable, so the supported set is derived
        // from the seeds themselves.
        kb
    }

    /// Load a knowledge base from a JSON file
    ///
    /// Format: `{ "crop": { "disease": { "cultural": [...], "biological":
    /// [...], "chemical": [...] } } }`. Tier keys may be omitted; action
    /// objects carry `id`, `description` and an optional `dosage`. The tier
    /// field on each action is assigned from its slot.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge base file: {:?}", path))?;

        let table: HashMap<String, HashMap<String, TierSpec>> =
            serde_json::from_str(&contents).with_context(|| "Failed to parse knowledge base JSON")?;

        let mut kb = KnowledgeBase::default();

        for (crop, diseases) in table {
            for (disease, tiers) in diseases {
                for tier in ControlTier::ALL {
                    for action in tiers.slot(tier) {
                        kb.insert_action(
                            &crop,
                            &disease,
                            ControlAction {
                                tier,
                                id: action.id.clone(),
                                description: action.description.clone(),
                                dosage: action.dosage.clone(),
                            },
                        );
                    }
                }
                // Keep diseases that list only empty tiers reachable
                kb.ensure_entry(&crop, &disease);
            }
        }

        if kb.is_empty() {
            anyhow::bail!("knowledge base file {:?} contains no entries", path);
        }

        Ok(kb)
    }

    fn ensure_entry(&mut self, crop: &str, disease: &str) {
        let crop = normalize_key(crop);
        let disease = normalize_key(disease);
        self.crops.insert(crop.clone());
        self.entries.entry((crop, disease)).or_default();
    }

    fn insert_action(&mut self, crop: &str, disease: &str, action: ControlAction) {
        let crop = normalize_key(crop);
        let disease = normalize_key(disease);
        let tier = action.tier;

        self.crops.insert(crop.clone());
        self.entries
            .entry((crop, disease))
            .or_default()
            .slot_mut(tier)
            .push(action);
    }

    /// Whether the crop is in the supported set (key already normalized)
    pub fn contains_crop(&self, crop: &str) -> bool {
        self.crops.contains(crop)
    }

    /// Supported crops, sorted for stable display
    pub fn crops(&self) -> Vec<&str> {
        let mut crops: Vec<&str> = self.crops.iter().map(String::as_str).collect();
        crops.sort_unstable();
        crops
    }

    /// Diseases recognized for a crop, sorted for stable display
    pub fn diseases_for(&self, crop: &str) -> Vec<&str> {
        let crop = normalize_key(crop);
        let mut diseases: Vec<&str> = self
            .entries
            .keys()
            .filter(|(c, _)| *c == crop)
            .map(|(_, d)| d.as_str())
            .collect();
        diseases.sort_unstable();
        diseases
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject the crop if unsupported (input normalized internally)
    pub fn ensure_crop(&self, crop: &str) -> Result<(), RecommenderError> {
        let normalized = normalize_key(crop);
        if self.contains_crop(&normalized) {
            Ok(())
        } else {
            Err(RecommenderError::UnknownCrop {
                crop: normalized,
                supported: self.crops().join(", "),
            })
        }
    }

    /// Look up the tiered actions for a `(crop, disease)` pair
    ///
    /// Referentially transparent: the same input always yields the same
    /// reference data. Unknown crops and diseases are reported, never
    /// silently defaulted.
    pub fn lookup(&self, crop: &str, disease: &str) -> Result<&TieredActions, RecommenderError> {
        let crop = normalize_key(crop);
        let disease = normalize_key(disease);

        self.ensure_crop(&crop)?;

        self.entries
            .get(&(crop.clone(), disease.clone()))
            .ok_or(RecommenderError::UnknownDisease { crop, disease })
    }
}

/// JSON tier slots for `KnowledgeBase::load` (tier assigned from the slot)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TierSpec {
    cultural: Vec<ActionSpec>,
    biological: Vec<ActionSpec>,
    chemical: Vec<ActionSpec>,
}

impl TierSpec {
    fn slot(&self, tier: ControlTier) -> &[ActionSpec] {
        match tier {
            ControlTier::Cultural => &self.cultural,
            ControlTier::Biological => &self.biological,
            ControlTier::Chemical => &self.chemical,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ActionSpec {
    id: String,
    description: String,
    #[serde(default)]
    dosage: Option<String>,
}

// ============================================================================
// EMBEDDED KNOWLEDGE BASE SEED DATA
// Crop/disease coverage follows the supported sets: crops {tomato, potato,
// rice, wheat, maize}; the "healthy" label is handled by the engine and has
// no entry here.
// ============================================================================

struct SeedAction {
    crop: &'static str,
    disease: &'static str,
    tier: ControlTier,
    id: &'static str,
    description: &'static str,
    dosage: Option<&'static str>,
}

static BUILTIN_ACTIONS: &[SeedAction] = &[
    // --- tomato / early_blight ---
    SeedAction { crop: "tomato", disease: "early_blight", tier: ControlTier::Cultural, id: "remove_infected_leaves", description: "Remove and destroy infected lower leaves at first sign of target-board lesions", dosage: None },
    SeedAction { crop: "tomato", disease: "early_blight", tier: ControlTier::Cultural, id: "mulch_soil", description: "Mulch around the base to stop rain splash carrying spores from soil to foliage", dosage: None },
    SeedAction { crop: "tomato", disease: "early_blight", tier: ControlTier::Cultural, id: "stake_plants", description: "Stake or cage plants to improve air circulation and speed leaf drying", dosage: None },
    SeedAction { crop: "tomato", disease: "early_blight", tier: ControlTier::Biological, id: "bacillus_subtilis_spray", description: "Foliar spray of Bacillus subtilis (QST 713 strain) suspension", dosage: Some("5 g/L, weekly until pressure drops") },
    SeedAction { crop: "tomato", disease: "early_blight", tier: ControlTier::Biological, id: "trichoderma_drench", description: "Soil drench with Trichoderma viride around the stem base", dosage: Some("10 g per plant") },
    SeedAction { crop: "tomato", disease: "early_blight", tier: ControlTier::Chemical, id: "chlorothalonil_wp", description: "Chlorothalonil 75% WP foliar spray", dosage: Some("2 g/L every 7-10 days") },
    SeedAction { crop: "tomato", disease: "early_blight", tier: ControlTier::Chemical, id: "mancozeb_wp", description: "Mancozeb 75% WP protectant spray, reapply after rain", dosage: Some("2.5 g/L") },

    // --- tomato / late_blight ---
    SeedAction { crop: "tomato", disease: "late_blight", tier: ControlTier::Cultural, id: "destroy_volunteers", description: "Destroy volunteer tomato and potato plants and cull piles near the field", dosage: None },
    SeedAction { crop: "tomato", disease: "late_blight", tier: ControlTier::Cultural, id: "drip_irrigation", description: "Switch to drip irrigation and keep foliage dry overnight", dosage: None },
    SeedAction { crop: "tomato", disease: "late_blight", tier: ControlTier::Cultural, id: "widen_spacing", description: "Widen plant spacing so the canopy dries quickly after dew or rain", dosage: None },
    SeedAction { crop: "tomato", disease: "late_blight", tier: ControlTier::Biological, id: "bacillus_subtilis_spray", description: "Foliar spray of Bacillus subtilis suspension as a protectant", dosage: Some("5 g/L, 5-7 day interval") },
    SeedAction { crop: "tomato", disease: "late_blight", tier: ControlTier::Chemical, id: "metalaxyl_mancozeb", description: "Metalaxyl 8% + Mancozeb 64% WP systemic/protectant mix", dosage: Some("2.5 g/L at first water-soaked lesion") },
    SeedAction { crop: "tomato", disease: "late_blight", tier: ControlTier::Chemical, id: "cymoxanil_mancozeb", description: "Cymoxanil 8% + Mancozeb 64% WP, rotate with other modes of action", dosage: Some("3 g/L") },

    // --- tomato / bacterial_spot ---
    SeedAction { crop: "tomato", disease: "bacterial_spot", tier: ControlTier::Cultural, id: "certified_seed", description: "Use certified disease-free seed and transplants", dosage: None },
    SeedAction { crop: "tomato", disease: "bacterial_spot", tier: ControlTier::Cultural, id: "rotate_non_host", description: "Rotate away from solanaceous hosts for at least two seasons", dosage: None },
    SeedAction { crop: "tomato", disease: "bacterial_spot", tier: ControlTier::Cultural, id: "avoid_wet_handling", description: "Avoid working the crop while foliage is wet", dosage: None },
    SeedAction { crop: "tomato", disease: "bacterial_spot", tier: ControlTier::Biological, id: "bacteriophage_spray", description: "Apply a Xanthomonas-specific bacteriophage formulation at dusk", dosage: Some("as formulated, twice weekly") },
    SeedAction { crop: "tomato", disease: "bacterial_spot", tier: ControlTier::Chemical, id: "copper_hydroxide", description: "Copper hydroxide 77% WP spray", dosage: Some("2 g/L, 7-day interval") },
    SeedAction { crop: "tomato", disease: "bacterial_spot", tier: ControlTier::Chemical, id: "copper_mancozeb", description: "Copper oxychloride + Mancozeb tank mix where copper resistance is suspected", dosage: Some("2 g/L + 2 g/L") },

    // --- potato / early_blight ---
    SeedAction { crop: "potato", disease: "early_blight", tier: ControlTier::Cultural, id: "hill_soil", description: "Hill soil around stems and remove senescing lower leaves", dosage: None },
    SeedAction { crop: "potato", disease: "early_blight", tier: ControlTier::Cultural, id: "remove_debris", description: "Plough in or remove infected haulm debris after harvest", dosage: None },
    SeedAction { crop: "potato", disease: "early_blight", tier: ControlTier::Biological, id: "trichoderma_drench", description: "Soil application of Trichoderma viride enriched compost", dosage: Some("2.5 kg/ha with farmyard manure") },
    SeedAction { crop: "potato", disease: "early_blight", tier: ControlTier::Chemical, id: "chlorothalonil_wp", description: "Chlorothalonil 75% WP foliar spray", dosage: Some("2 g/L every 7-10 days") },
    SeedAction { crop: "potato", disease: "early_blight", tier: ControlTier::Chemical, id: "azoxystrobin_sc", description: "Azoxystrobin 23% SC, limit to two sequential applications", dosage: Some("1 ml/L") },

    // --- potato / late_blight ---
    SeedAction { crop: "potato", disease: "late_blight", tier: ControlTier::Cultural, id: "destroy_cull_piles", description: "Destroy cull piles and volunteers before emergence", dosage: None },
    SeedAction { crop: "potato", disease: "late_blight", tier: ControlTier::Cultural, id: "harvest_dry", description: "Harvest in dry weather after vines are fully dead to protect tubers", dosage: None },
    SeedAction { crop: "potato", disease: "late_blight", tier: ControlTier::Biological, id: "bacillus_subtilis_spray", description: "Foliar spray of Bacillus subtilis suspension as a protectant", dosage: Some("5 g/L, 5-7 day interval") },
    SeedAction { crop: "potato", disease: "late_blight", tier: ControlTier::Chemical, id: "metalaxyl_mancozeb", description: "Metalaxyl 8% + Mancozeb 64% WP at first symptoms", dosage: Some("2.5 g/L") },
    SeedAction { crop: "potato", disease: "late_blight", tier: ControlTier::Chemical, id: "cyazofamid_sc", description: "Cyazofamid 34.5% SC, rotate modes of action between sprays", dosage: Some("0.6 ml/L") },

    // --- rice / bacterial_leaf_blight ---
    SeedAction { crop: "rice", disease: "bacterial_leaf_blight", tier: ControlTier::Cultural, id: "balanced_nitrogen", description: "Split nitrogen applications and avoid excess urea, which favors the pathogen", dosage: None },
    SeedAction { crop: "rice", disease: "bacterial_leaf_blight", tier: ControlTier::Cultural, id: "drain_field", description: "Drain the field to interrupt spread through standing water", dosage: None },
    SeedAction { crop: "rice", disease: "bacterial_leaf_blight", tier: ControlTier::Cultural, id: "resistant_variety", description: "Plant varieties carrying Xa21 or comparable resistance next season", dosage: None },
    SeedAction { crop: "rice", disease: "bacterial_leaf_blight", tier: ControlTier::Biological, id: "pseudomonas_seed", description: "Seed treatment with Pseudomonas fluorescens before sowing", dosage: Some("10 g/kg seed") },
    SeedAction { crop: "rice", disease: "bacterial_leaf_blight", tier: ControlTier::Chemical, id: "copper_oxychloride", description: "Copper oxychloride 50% WP foliar spray", dosage: Some("3 g/L") },
    SeedAction { crop: "rice", disease: "bacterial_leaf_blight", tier: ControlTier::Chemical, id: "streptocycline_mix", description: "Streptomycin sulphate + tetracycline spray where permitted", dosage: Some("0.15 g/L") },

    // --- wheat / rust ---
    // No biological tier here: the entry still exposes an empty slot.
    SeedAction { crop: "wheat", disease: "rust", tier: ControlTier::Cultural, id: "early_sowing", description: "Sow early to escape the peak urediniospore shower", dosage: None },
    SeedAction { crop: "wheat", disease: "rust", tier: ControlTier::Cultural, id: "remove_alternate_hosts", description: "Remove barberry and other alternate hosts near the field", dosage: None },
    SeedAction { crop: "wheat", disease: "rust", tier: ControlTier::Chemical, id: "propiconazole_ec", description: "Propiconazole 25% EC at first pustule", dosage: Some("1 ml/L") },
    SeedAction { crop: "wheat", disease: "rust", tier: ControlTier::Chemical, id: "tebuconazole_ec", description: "Tebuconazole 25.9% EC follow-up spray after 15 days if pustules persist", dosage: Some("1 ml/L") },

    // --- maize / rust ---
    SeedAction { crop: "maize", disease: "rust", tier: ControlTier::Cultural, id: "resistant_hybrid", description: "Switch to a resistant hybrid for the next planting", dosage: None },
    SeedAction { crop: "maize", disease: "rust", tier: ControlTier::Cultural, id: "rogue_infected", description: "Rogue heavily infected plants while incidence is still patchy", dosage: None },
    SeedAction { crop: "maize", disease: "rust", tier: ControlTier::Biological, id: "bacillus_pumilus_spray", description: "Foliar spray of Bacillus pumilus (QST 2808 strain)", dosage: Some("as formulated, 7-day interval") },
    SeedAction { crop: "maize", disease: "rust", tier: ControlTier::Chemical, id: "mancozeb_wp", description: "Mancozeb 75% WP protectant spray", dosage: Some("2.5 g/L") },
    SeedAction { crop: "maize", disease: "rust", tier: ControlTier::Chemical, id: "pyraclostrobin_ec", description: "Pyraclostrobin 20% WG at disease onset, maximum two sprays", dosage: Some("1 g/L") },

    // --- maize / stalk_rot ---
    SeedAction { crop: "maize", disease: "stalk_rot", tier: ControlTier::Cultural, id: "balanced_potash", description: "Maintain potassium fertility; high N:K ratios predispose stalks to rot", dosage: None },
    SeedAction { crop: "maize", disease: "stalk_rot", tier: ControlTier::Cultural, id: "avoid_water_stress", description: "Avoid water stress during grain fill with even irrigation scheduling", dosage: None },
    SeedAction { crop: "maize", disease: "stalk_rot", tier: ControlTier::Cultural, id: "harvest_promptly", description: "Harvest lodging-prone fields promptly at maturity", dosage: None },
    SeedAction { crop: "maize", disease: "stalk_rot", tier: ControlTier::Biological, id: "trichoderma_furrow", description: "Trichoderma harzianum furrow application at sowing", dosage: Some("2.5 kg/ha with farmyard manure") },
    SeedAction { crop: "maize", disease: "stalk_rot", tier: ControlTier::Chemical, id: "carbendazim_drench", description: "Carbendazim 50% WP drench at the plant base in affected patches", dosage: Some("1 g/L") },
];
