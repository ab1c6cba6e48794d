use crate::cli::config::ClientConfig;
use crate::cli::utils::output_data;
use crate::cli::OutputFormat;

use super::signed_in_client;

/// Print the RBAC audit report (super-admin only).
pub async fn report(config: &ClientConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let report = signed_in_client(config)?.rbac_report().await?;
    output_data(&output_format, &report, |report| {
        println!("Users: {}", report.total_users);
        for entry in &report.roles {
            println!(
                "{:<20} {:>4} member(s)  [{}]",
                entry.role.name, entry.members, entry.role.permissions
            );
        }
        if !report.dangling_users.is_empty() {
            println!("Users with a missing role:");
            for id in &report.dangling_users {
                println!("  {}", id);
            }
        }
    })
}
