// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fake-plugin <name>` commands

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mf_peers::pubsub::{Publisher, Subscriber};
use mf_peers::{Plugin, PluginClient};
use mf_wire::Command;
use tracing::info;

use super::{parse_command, wait_while};
use crate::output::{print_reply, OutputFormat};

#[derive(Parser)]
#[command(name = "fake-plugin", version = crate::VERSION, about = "Fake product plugin")]
pub struct PluginCli {
    /// IPC directory (default: $MF_IPC_DIR, then $TMPDIR/mf-ipc)
    #[arg(long, global = true)]
    pub ipc_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t, global = true)]
    pub format: OutputFormat,

    /// Plugin name, e.g. SAVPlugin
    pub name: String,

    #[command(subcommand)]
    pub command: PluginCommand,
}

#[derive(Subcommand)]
pub enum PluginCommand {
    /// Serve the plugin socket until the agent sends Stop
    Serve {
        /// Register with the agent once serving
        #[arg(long)]
        register: bool,
        /// Status answered to the agent's RequestStatus
        #[arg(long, num_args = 3, value_names = ["APP_ID", "STATUS_XML", "STATUS_WITHOUT_XML"])]
        status: Option<Vec<String>>,
        /// Telemetry answered to the agent's RequestTelemetry
        #[arg(long)]
        telemetry: Option<String>,
    },
    /// Register with the agent
    Register,
    /// Ask the agent for an appId's policy
    RequestPolicy { app_id: String },
    SendEvent { app_id: String, event: String },
    SendStatus { app_id: String, status_xml: String, status_without_xml: String },
    SendTelemetry { telemetry: String },
    /// Send an arbitrary command to the agent
    SendCustom {
        app_id: String,
        #[arg(value_parser = parse_command)]
        command: Command,
        payload: Vec<String>,
    },
    /// Publish one message on the data channel
    Publish { topic: String, message: String },
    /// Print messages arriving on a data-channel topic
    Listen {
        topic: String,
        #[arg(long, default_value_t = 1)]
        count: usize,
        /// Seconds to wait for each message
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

pub fn run(cli: PluginCli) -> Result<()> {
    let config = crate::ipc_config(cli.ipc_dir);
    let format = cli.format;
    let client = PluginClient::new(cli.name.clone(), &config);

    match cli.command {
        PluginCommand::Serve { register, status, telemetry } => {
            let mut plugin = Plugin::start(cli.name, &config)?;
            if let Some([app_id, status_xml, status_without_xml]) = status.as_deref() {
                plugin.set_status(app_id, status_xml, status_without_xml)?;
            }
            if let Some(telemetry) = telemetry {
                plugin.set_telemetry(&telemetry)?;
            }
            if register {
                print_reply(plugin.register()?, format)?;
            }
            info!(plugin = plugin.name(), endpoint = %plugin.endpoint(), "fake plugin serving");
            wait_while(config.poll_interval, || plugin.is_running());
            plugin.stop();
            Ok(())
        }
        PluginCommand::Register => print_reply(client.register()?, format),
        PluginCommand::RequestPolicy { app_id } => print_reply(client.request_policy(&app_id)?, format),
        PluginCommand::SendEvent { app_id, event } => {
            print_reply(client.send_event(&app_id, &event)?, format)
        }
        PluginCommand::SendStatus { app_id, status_xml, status_without_xml } => {
            print_reply(client.send_status(&app_id, &status_xml, &status_without_xml)?, format)
        }
        PluginCommand::SendTelemetry { telemetry } => {
            print_reply(client.send_telemetry(&telemetry)?, format)
        }
        PluginCommand::SendCustom { app_id, command, payload } => {
            print_reply(client.send_custom_message(&app_id, &cli.name, command, payload)?, format)
        }
        PluginCommand::Publish { topic, message } => {
            let mut publisher = Publisher::start(cli.name, &config)?;
            publisher.send_text(&topic, &message)?;
            publisher.close_socket()?;
            Ok(())
        }
        PluginCommand::Listen { topic, count, timeout } => {
            let mut subscriber = Subscriber::new(cli.name, vec![topic.clone()], &config);
            subscriber.start()?;
            for _ in 0..count {
                println!("{}", subscriber.get_next_text(&topic, Duration::from_secs(timeout))?);
            }
            subscriber.stop();
            Ok(())
        }
    }
}
