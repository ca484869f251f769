// Terminal UI utilities
// Everything here writes to stderr; stdout carries only the deployment plan.

use colored::Colorize;

use crate::domain::plan::DeploymentPlan;

pub fn print_header(title: &str) {
    eprintln!();
    eprintln!(
        "{}",
        "╔════════════════════════════════════════════════════════════╗".bright_blue()
    );
    eprintln!("{}", format!("║  {:<58}║", title).bright_blue());
    eprintln!(
        "{}",
        "╚════════════════════════════════════════════════════════════╝".bright_blue()
    );
    eprintln!();
}

pub fn print_success(message: &str) {
    eprintln!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_info(message: &str) {
    eprintln!("{}", format!("ℹ️  {}", message).bright_cyan());
}

/// One line per stack: position, name, dependencies
pub fn print_stack_order<'a>(stacks: impl IntoIterator<Item = (&'a str, &'a [String])>) {
    for (i, (name, deps)) in stacks.into_iter().enumerate() {
        if deps.is_empty() {
            eprintln!("  {}. {}", i + 1, name.bold());
        } else {
            eprintln!(
                "  {}. {} {}",
                i + 1,
                name.bold(),
                format!("(after {})", deps.join(", ")).dimmed()
            );
        }
    }
}

pub fn print_plan_summary(plan: &DeploymentPlan) {
    print_header(&format!("Deployment {}", plan.deployment_id));
    print_stack_order(
        plan.stacks
            .iter()
            .map(|s| (s.name.as_str(), s.dependencies.as_slice())),
    );
    eprintln!();
}
