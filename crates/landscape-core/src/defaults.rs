//! The bundled default research dataset.
//!
//! Adopted on first run and whenever the persisted blob is unreadable.
//! Built in code rather than parsed from an embedded file, so producing it
//! cannot fail.

use crate::models::{Company, SavedResearch, SegmentAnalysis};

fn entry(summary: &str, trends: &[&str], companies: &[(&str, &str, &str)]) -> SegmentAnalysis {
    SegmentAnalysis {
        companies: companies
            .iter()
            .map(|(name, spec, desc)| Company::new(*name, *spec, *desc))
            .collect(),
        summary: summary.to_string(),
        trends: trends.iter().map(|t| t.to_string()).collect(),
    }
}

/// One analysis per catalog segment.
pub fn default_research() -> SavedResearch {
    let mut research = SavedResearch::new();

    research.insert(
        "gp-monolithic".to_string(),
        entry(
            "Standard high-performance silicon. Dominant for legacy training workloads but facing the reticle limit.",
            &["Transition to 2nm nodes", "Liquid cooling reliance", "Monolithic yields"],
            &[
                ("NVIDIA", "Ampere/Hopper (A100, H100)", "Industry standard for training using massive parallel SIMT architecture."),
                ("Intel", "Max Series (Ponte Vecchio)", "High-density discrete GPUs for scientific HPC and AI training."),
            ],
        ),
    );
    research.insert(
        "gp-chiplet".to_string(),
        entry(
            "Multi-die fusion overcoming physical size limits. Treating the entire rack as a single unit of compute.",
            &["3D Packaging", "UCIe Interconnects", "Factory topology"],
            &[
                ("NVIDIA", "Blackwell / Rubin", "Dual-die designs fused by 10 TB/s bridges; Rubin introduces HBM4 and Vera CPU co-design."),
                ("AMD", "CDNA 3/4 (MI300X, MI350)", "Chiplet-based data center GPUs offering massive memory capacity via 3D packaging."),
                ("Biren Tech", "BR100 (Hejia)", "Twin-engine superchip using chiplet stitching to bypass reticle limits."),
            ],
        ),
    );
    research.insert(
        "gp-universal".to_string(),
        entry(
            "Unifying CPU, GPU, and TPU logic into a single core to eliminate the communication tax.",
            &["Unified execution", "Zero-overhead offloading"],
            &[(
                "Tachyum",
                "Prodigy",
                "Universal processor that dynamically switches between general apps and AI math.",
            )],
        ),
    );
    research.insert(
        "ds-systolic".to_string(),
        entry(
            "Data flows neighbor-to-neighbor in an assembly line fashion, drastically reducing memory fetching energy.",
            &["Optical switching", "Linear scaling"],
            &[
                ("Google", "TPU (v4-v6, Trillium)", "The pioneer of systolic arrays for AI; uses Optical Circuit Switching (OCS) for reconfiguration."),
                ("AWS", "Trainium / Inferentia", "Custom ASICs designed for model training/inference with deterministic execution."),
                ("Huawei", "Ascend (910B, 910C)", "Da Vinci architecture with 3D Cube cores for high-density matrix math."),
            ],
        ),
    );
    research.insert(
        "ds-dataflow".to_string(),
        entry(
            "Hardware that \"rewires\" based on the software model, creating physical pipes for data flow.",
            &["Instruction-less execution", "SRAM-only efficiency"],
            &[
                ("Groq", "LPU", "LPU architecture focusing on ultra-low latency inference via deterministic electron planning."),
                ("SambaNova", "RDU (SN40L)", "Reconfigurable Dataflow Unit with triple-tier memory for trillion-parameter models."),
                ("NextSilicon", "Maverick-2", "Intelligent Compute Architecture that learns app behavior to reconfigure hotspots in real-time."),
                ("Furiosa AI", "RNGD (Renegade)", "Focuses on \"sustainable\" AI inference using Tensor Contraction Processor (TCP) logic."),
                ("Rebellions", "REBEL-Quad", "South Korean unicorn using mixed-precision pipelines for hyperscale inference."),
            ],
        ),
    );
    research.insert(
        "ds-workload-asic".to_string(),
        entry(
            "Extreme specialization. Stripping out all general logic to support one specific architecture (e.g. Transformers).",
            &["Transformer-native silicon", "Recommendation optimization"],
            &[
                ("Etched", "Soho (Transformer ASIC)", "Hardwired exclusively for Transformers; 20x faster than H100 by baking attention into silicon."),
                ("Meta", "MTIA v2", "In-house silicon optimized for Deep Learning Recommendation Models (DLRMs)."),
                ("Microsoft", "Maia 100", "Azure-custom accelerator for OpenAI workloads like GPT-4 and Copilot."),
                ("Intel", "Habana Gaudi (2/3)", "Dedicated AI accelerator with integrated on-chip Ethernet for low-cost scaling."),
                ("Axelera AI", "Titania / Metis", "D-IMC architecture bringing data-center performance to the edge (robots, drones)."),
                ("Fractile", "In-Memory Compute", "Breaking the memory wall by interleaving memory and compute for frontier LLM reasoning."),
            ],
        ),
    );
    research.insert(
        "si-wafer".to_string(),
        entry(
            "The world's fastest inference by keeping the entire wafer as one massive piece of silicon.",
            &["Wafer-scale integration", "Redundant routing"],
            &[(
                "Cerebras",
                "WSE-3",
                "The size of a dinner plate; keeps weights in massive SRAM to generate 2,500+ tokens/sec.",
            )],
        ),
    );
    research.insert(
        "si-packaging".to_string(),
        entry(
            "The physical backbone of modern compute. Stacking logic and memory in 3D.",
            &["Wafer-on-Wafer (WoW)", "Direct copper bonding"],
            &[
                ("Graphcore", "Bow IPU", "First to use 3D WoW stacking to place memory directly on top of logic tiles."),
                ("Marvell", "Custom ASIC / HBM Compute", "Specializes in the \"Ghost Writing\" of custom ASICs for the top cloud providers."),
            ],
        ),
    );
    research.insert(
        "si-fabric".to_string(),
        entry(
            "Intelligent interconnects that bypass standard networking bottlenecks.",
            &["Optical I/O", "Mesh scaling fabrics"],
            &[
                ("Tenstorrent", "Wormhole / Tensix", "Jim Keller architecture using RISC-V to decouple communication from computation."),
                ("Marvell", "Nova / Spica (Optical DSP)", "Optical interconnects translating electrical signals to light for warehouse-scale clusters."),
                ("d-Matrix", "Corsair", "Digital In-Memory Compute with DMX Link for real-time AI agents."),
            ],
        ),
    );
    research.insert(
        "rh-reconfigurable".to_string(),
        entry(
            "Post-manufacturing flexible logic. Adapts physical circuits to specific algorithmic flows.",
            &["Software-defined hardware", "Deterministic latency", "Edge AI scalability"],
            &[
                ("Edge FPGAs", "Lattice / Altera", "Small, power-constrained devices (<10W) designed for robotics and autonomous vehicles."),
                ("Heronic.ai", "mosaIC Toolflow", "Software that automatically designs bespoke hardware architectures for specific AI models."),
                ("Efficient Computer", "Electron E1 / Fabric", "Spatial Dataflow model that eliminates instruction-fetch overhead, achieving 100x efficiency."),
            ],
        ),
    );
    research.insert(
        "ep-analog".to_string(),
        entry(
            "Computing with continuous physical properties rather than discrete binary steps.",
            &["Passive computing", "Landauer limit bypass"],
            &[
                ("Irreversible Inc", "Minimum Viable Intel", "Low-power analog chips replacing 500W GPUs for edge robots/drones."),
                ("Mythic", "M2000 AMP", "Analog matrix processing using flash memory charges for matrix-vector multiplication."),
                ("Vaire", "Ice River", "Reversible computing aiming for near-zero energy consumption via adiabatic switching."),
                ("Alibaba", "ACCEL", "Photonic-electronic hybrid chip claimed to be 3000x faster than A100 for vision."),
            ],
        ),
    );
    research.insert(
        "ep-photonic".to_string(),
        entry(
            "Native computing using light waves. Math happens \"in-flight\" with zero resistance.",
            &["Silicon photonics", "LNOI cristal logic"],
            &[(
                "Q.ANT",
                "Native NPU",
                "Photonic processor using light interference to handle non-linear AI functions natively.",
            )],
        ),
    );
    research.insert(
        "ep-neuromorphic".to_string(),
        entry(
            "Architectures that mimic the biological structure of the human brain.",
            &["SNN (Spiking Neural Networks)", "Co-located memory"],
            &[
                ("IBM", "NorthPole", "Brain-inspired digital chip with 256 cores, each with local memory; 25x more efficient."),
                ("Applied Brain Research", "LMU / TSP1", "Time-series processor for always-on speech intelligence in battery-constrained gear."),
                ("Greatsky", "Superconducting Neurons", "Integrating superconductors and photonics for exascale intelligence from first principles."),
            ],
        ),
    );

    research
}
