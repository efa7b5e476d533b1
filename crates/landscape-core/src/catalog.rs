//! The static catalog of compute segments.
//!
//! Segments are defined once at build time and never change. A segment's
//! `id` is the join key into the research store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Architecture category a segment belongs to. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "General Purpose")]
    GeneralPurpose,
    #[serde(rename = "Domain Specific")]
    DomainSpecific,
    #[serde(rename = "Scaling & Integration")]
    ScalingIntegration,
    #[serde(rename = "Reconfigurable Hardware")]
    ReconfigurableHardware,
    #[serde(rename = "Emerging Physics")]
    EmergingPhysics,
}

impl Category {
    /// Grid display order.
    pub const ALL: [Category; 5] = [
        Category::GeneralPurpose,
        Category::DomainSpecific,
        Category::ScalingIntegration,
        Category::ReconfigurableHardware,
        Category::EmergingPhysics,
    ];

    /// Order used by the market overview.
    pub const OVERVIEW_ORDER: [Category; 5] = [
        Category::GeneralPurpose,
        Category::ScalingIntegration,
        Category::DomainSpecific,
        Category::ReconfigurableHardware,
        Category::EmergingPhysics,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::GeneralPurpose => "General Purpose",
            Category::DomainSpecific => "Domain Specific",
            Category::ScalingIntegration => "Scaling & Integration",
            Category::ReconfigurableHardware => "Reconfigurable Hardware",
            Category::EmergingPhysics => "Emerging Physics",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Category::GeneralPurpose => "general-purpose",
            Category::DomainSpecific => "domain-specific",
            Category::ScalingIntegration => "scaling-integration",
            Category::ReconfigurableHardware => "reconfigurable-hardware",
            Category::EmergingPhysics => "emerging-physics",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::GeneralPurpose => {
                "Standard processors designed for general computing tasks and data centers."
            }
            Category::DomainSpecific => {
                "Specialized processors optimized for specific workloads like AI inference and data processing."
            }
            Category::ScalingIntegration => {
                "3D chip stacking and chiplet technologies that improve performance and reduce power consumption."
            }
            Category::ReconfigurableHardware => {
                "Hardware that can be reprogrammed or reconfigured for different computing tasks."
            }
            Category::EmergingPhysics => {
                "New computing technologies using photonics, analog computing, and alternative approaches."
            }
        }
    }

    /// Sectors flagged as investment priorities in the overview.
    pub fn is_priority(&self) -> bool {
        matches!(
            self,
            Category::ScalingIntegration | Category::EmergingPhysics
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    /// Accepts the display label (any case) or the kebab slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted) || c.slug().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown category '{}'. Expected one of: {}",
                    s,
                    Category::ALL.map(|c| c.slug()).join(", ")
                )
            })
    }
}

/// One chip-architecture segment of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeSegment {
    pub id: &'static str,
    pub category: Category,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub description: &'static str,
    pub side_tag: &'static str,
    pub model: &'static str,
    pub math: &'static str,
    pub scale: &'static str,
    pub icon: &'static str,
}

static SEGMENTS: [ComputeSegment; 13] = [
    ComputeSegment {
        id: "gp-monolithic",
        category: Category::GeneralPurpose,
        title: "Monolithic GPU",
        subtitle: "Nvidia Hopper / Intel Max",
        description: "Traditional massive single-die processors. The legacy \"Swiss Army Knife\" of AI training.",
        side_tag: "LEGACY",
        model: "Single Die",
        math: "SIMT",
        scale: "Reticle Limit",
        icon: "🔳",
    },
    ComputeSegment {
        id: "gp-chiplet",
        category: Category::GeneralPurpose,
        title: "Chiplet / Factory",
        subtitle: "Blackwell / MI300X",
        description: "Modular dual-die designs fused by high-speed bridges. Overcomes yield and size limits.",
        side_tag: "STANDARD",
        model: "Multi-Die",
        math: "HBI Link",
        scale: "120kW+ Racks",
        icon: "🧩",
    },
    ComputeSegment {
        id: "gp-universal",
        category: Category::GeneralPurpose,
        title: "Universal Proc.",
        subtitle: "Tachyum Prodigy",
        description: "Converged CPU/GPU/TPU functionality. Aims to eliminate the Von Neumann bottleneck.",
        side_tag: "UNIFIED",
        model: "Homogeneous",
        math: "No-Offload",
        scale: "High Util.",
        icon: "🌀",
    },
    ComputeSegment {
        id: "ds-systolic",
        category: Category::DomainSpecific,
        title: "Systolic Array",
        subtitle: "Google TPU / Trainium",
        description: "Assembly-line data flow. Passes results neighbor-to-neighbor to save energy.",
        side_tag: "EFFICIENCY",
        model: "2D Mesh",
        math: "Tensor Logic",
        scale: "Large Clusters",
        icon: "🌊",
    },
    ComputeSegment {
        id: "ds-dataflow",
        category: Category::DomainSpecific,
        title: "Dataflow / LPU",
        subtitle: "Groq / SambaNova",
        description: "Deterministic planning of electron movement. Focuses on pure inference latency.",
        side_tag: "DETERMINISTIC",
        model: "SRAM-only",
        math: "No Traffic-Cop",
        scale: "Inference Focus",
        icon: "🏎️",
    },
    ComputeSegment {
        id: "ds-workload-asic",
        category: Category::DomainSpecific,
        title: "Workload ASIC",
        subtitle: "Etched / MTIA / Maia",
        description: "Hardwired for specific models (Transformers) or recommendation engines.",
        side_tag: "HYPER-SPEC",
        model: "Fixed Logic",
        math: "Native Attn.",
        scale: "Hyperscale",
        icon: "🧬",
    },
    ComputeSegment {
        id: "si-wafer",
        category: Category::ScalingIntegration,
        title: "Wafer Scale",
        subtitle: "Cerebras WSE-3",
        description: "Giant chips using an entire 300mm wafer to eliminate interconnect lag.",
        side_tag: "ULTRA-SPEED",
        model: "850k+ Cores",
        math: "On-Wafer",
        scale: "20x GPU Speed",
        icon: "💿",
    },
    ComputeSegment {
        id: "si-packaging",
        category: Category::ScalingIntegration,
        title: "Adv. Packaging",
        subtitle: "CoWoS / Hybrid Bond",
        description: "3D vertical stacking and silicon interposers. The physical glue of modern compute.",
        side_tag: "PHYSICAL",
        model: "Vertical",
        math: "Fine Pitch",
        scale: "HBM4 Ready",
        icon: "🧱",
    },
    ComputeSegment {
        id: "si-fabric",
        category: Category::ScalingIntegration,
        title: "Network-on-Chip",
        subtitle: "Tenstorrent / Graphcore",
        description: "MIMD architectures where every core is independent. Scalable mesh fabrics.",
        side_tag: "MESH",
        model: "Toroidal NoC",
        math: "MIMD Parallel",
        scale: "Sovereign AI",
        icon: "🕸️",
    },
    ComputeSegment {
        id: "rh-reconfigurable",
        category: Category::ReconfigurableHardware,
        title: "Adaptive Logic",
        subtitle: "Edge FPGA / Heronic",
        description: "Post-manufacturing flexible logic. Adapts physical circuits to specific algorithmic flows.",
        side_tag: "ADAPTIVE",
        model: "Spatial Fabric",
        math: "Logic Gates",
        scale: "Edge <10W",
        icon: "🏗️",
    },
    ComputeSegment {
        id: "ep-analog",
        category: Category::EmergingPhysics,
        title: "Analog IMC",
        subtitle: "Irreversible / Mythic",
        description: "In-memory computing using analog properties. Zero-bus \"dimmer switch\" logic.",
        side_tag: "LOW POWER",
        model: "Voltage Math",
        math: "Memristor",
        scale: "Edge AI <1W",
        icon: "🕯️",
    },
    ComputeSegment {
        id: "ep-photonic",
        category: Category::EmergingPhysics,
        title: "Photonic / Optical",
        subtitle: "Q.ANT / Lightmatter",
        description: "Computing with light. Native non-linear math without electrical resistance.",
        side_tag: "LIGHT SPEED",
        model: "Waveguides",
        math: "Interference",
        scale: "EMI Immune",
        icon: "🌈",
    },
    ComputeSegment {
        id: "ep-neuromorphic",
        category: Category::EmergingPhysics,
        title: "Neuromorphic",
        subtitle: "IBM NorthPole / ABR",
        description: "Brain-inspired spike logic. Co-located memory and logic for biological efficiency.",
        side_tag: "BIOLOGICAL",
        model: "Spiking NN",
        math: "ODEs / SNN",
        scale: "25x Efficiency",
        icon: "🧠",
    },
];

/// All segments, in catalog order.
pub fn segments() -> &'static [ComputeSegment] {
    &SEGMENTS
}

pub fn find(id: &str) -> Option<&'static ComputeSegment> {
    SEGMENTS.iter().find(|s| s.id == id)
}

pub fn contains(id: &str) -> bool {
    find(id).is_some()
}

/// Segments of one category, in catalog order.
pub fn by_category(category: Category) -> Vec<&'static ComputeSegment> {
    SEGMENTS.iter().filter(|s| s.category == category).collect()
}

pub fn segment_ids() -> Vec<String> {
    SEGMENTS.iter().map(|s| s.id.to_string()).collect()
}
