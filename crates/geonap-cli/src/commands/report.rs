//! Human-readable output

use geonap_core::{CostDelta, PlanOutcome, RankedProvider};
use geonap_scheduler::{CostSimulation, ModelAvailability};

pub fn print_outcome(outcome: &PlanOutcome) {
    let placement = &outcome.placement;

    if placement.is_empty() {
        println!("No GPUs could be placed");
    } else {
        println!(
            "{:<28} {:<12} {:>5} {:>9} {:>9} {:>8} {:>8} {:<10}",
            "PROVIDER", "MODEL", "GPUS", "$/HR", "EFF $/HR", "RTT MS", "GBPS", "TIER"
        );
        println!("{}", "-".repeat(96));
        for line in &placement.lines {
            println!(
                "{:<28} {:<12} {:>5} {:>9.3} {:>9.3} {:>8.1} {:>8.1} {:<10}",
                line.provider,
                line.gpu_model,
                line.gpus,
                line.price,
                line.effective_price,
                line.rtt_ms,
                line.bandwidth_gbps,
                line.tier
            );
        }
    }

    if placement.unmet_demand > 0 {
        println!("Warning: {} GPUs could not be placed", placement.unmet_demand);
    }
    if !outcome.forbidden.is_empty() {
        println!("Over latency bound: {}", outcome.forbidden.join(", "));
    }

    let b = &outcome.breakdown;
    println!();
    println!("Total cost:          ${:.2}", b.total_cost);
    println!("  Compute:           ${:.2}", b.compute_cost);
    println!("  Dataset egress:    ${:.2}", b.egress_cost);
    println!("  Inter-provider:    ${:.2}", b.inter_provider_cost);
    println!("Cost per epoch:      ${:.2}", b.cost_per_epoch);
    println!("Training time:       {:.2} h", b.total_time_hours);
    println!(
        "Steps:               {} ({} per epoch)",
        b.total_steps, b.steps_per_epoch
    );
    println!(
        "Per step:            {:.3}s compute, {:.3}s comm",
        b.compute_time_per_step_sec, b.comm_time_per_step_sec
    );

    if !b.pairwise_costs.is_empty() {
        println!();
        println!("{:<28} {:<28} {:>10} {:>8} {:>10}", "FROM", "TO", "$/GB", "PENALTY", "COST");
        for pair in &b.pairwise_costs {
            println!(
                "{:<28} {:<28} {:>10.3} {:>8.2} {:>10.2}",
                pair.src, pair.dst, pair.egress_rate, pair.bandwidth_penalty, pair.cost
            );
        }
    }
}

pub fn print_delta(delta: &CostDelta) {
    println!("Change vs base run");
    println!("  Total:             {:+.2}", delta.total_cost);
    println!("  Compute:           {:+.2}", delta.compute_cost);
    println!("  Dataset egress:    {:+.2}", delta.egress_cost);
    println!("  Inter-provider:    {:+.2}", delta.inter_provider_cost);
    println!("  Per epoch:         {:+.2}", delta.cost_per_epoch);
}

pub fn print_availability(availability: &[ModelAvailability]) {
    for entry in availability {
        println!(
            "{:<28} {}: {}",
            entry.provider,
            entry.model,
            if entry.available { "available" } else { "not offered" }
        );
    }
}

pub fn print_providers(providers: &[&RankedProvider]) {
    if providers.is_empty() {
        println!("No providers found");
        return;
    }

    println!(
        "{:<28} {:<12} {:>5} {:>9} {:>9} {:>8} {:>8}",
        "PROVIDER", "MODEL", "CAP", "$/HR", "EFF $/HR", "RTT MS", "GBPS"
    );
    println!("{}", "-".repeat(86));
    for p in providers {
        println!(
            "{:<28} {:<12} {:>5} {:>9.3} {:>9.3} {:>8.1} {:>8.1}",
            p.offer.id,
            p.offer.gpu_model,
            p.offer.capacity,
            p.offer.price,
            p.effective_price,
            p.offer.rtt_ms,
            p.offer.bandwidth_gbps
        );
    }
}

pub fn print_simulation(sim: &CostSimulation) {
    println!("Simulated {} runs around ${:.2} (seed {})", sim.runs, sim.mean_input, sim.seed);
    println!("  Mean:   ${:.2}", sim.mean);
    println!("  Std:    ${:.2}", sim.std_dev);
    println!("  P10:    ${:.2}", sim.p10);
    println!("  P50:    ${:.2}", sim.p50);
    println!("  P90:    ${:.2}", sim.p90);
    println!("  Range:  ${:.2} .. ${:.2}", sim.min, sim.max);
}
