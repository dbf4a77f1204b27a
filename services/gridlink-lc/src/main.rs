//! GridLink local-controller daemon.
//!
//! Loads the node configuration and the declarative signature policy, wires
//! up the networking node, and runs until interrupted. Transport listeners
//! attach peers to the node as stations connect.

use anyhow::{bail, Context, Result};
use gridlink_core::{config::NodeConfig, logging, NodeIdentity};
use gridlink_node::NetworkingNode;
use gridlink_policy::rules::{SigningAction, VerificationAction};
use gridlink_policy::{PolicyConfig, SignaturePolicy};
use gridlink_routing::RoutingTable;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = match parse_config_path(&args)? {
        Some(path) => NodeConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => NodeConfig::default_config(),
    };

    if config.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let policy = Arc::new(load_policy(&config)?);
    let mut routes = RoutingTable::new();
    if let Some(age) = config.routing.max_binding_age_secs {
        routes = routes.with_max_binding_age(Duration::from_secs(age));
    }
    let node = Arc::new(
        NetworkingNode::new(NodeIdentity::from(config.node_id.as_str()), policy)
            .with_routing_table(routes),
    );

    tracing::info!(
        node_id = %config.node_id,
        listen_port = config.listen_port,
        policy = node.policy().identification(),
        "local controller started"
    );

    if config.routing.max_binding_age_secs.is_some() {
        let reaper = node.clone();
        let interval = Duration::from_secs(config.routing.reap_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                reaper.routes().reap();
            }
        });
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown signal received");
    node.cancel();

    Ok(())
}

fn load_policy(config: &NodeConfig) -> Result<SignaturePolicy> {
    match &config.policy_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read policy file {path}"))?;
            let description: PolicyConfig =
                toml::from_str(&raw).with_context(|| format!("malformed policy file {path}"))?;
            Ok(SignaturePolicy::from_config(&description)?)
        }
        // Without a policy file the node relays everything untouched.
        None => Ok(SignaturePolicy::new(
            "open-policy",
            SigningAction::ForwardUnsigned,
            None,
            VerificationAction::AcceptUnverified,
            None,
        )?),
    }
}

fn parse_config_path(args: &[String]) -> Result<Option<PathBuf>> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == "--config" {
            match args_iter.next() {
                Some(path) => return Ok(Some(PathBuf::from(path))),
                None => bail!("--config was provided without a path"),
            }
        }
    }
    Ok(None)
}
