// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fake-agent` commands

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mf_peers::pubsub::DataChannelProxy;
use mf_peers::{Agent, AgentClient};
use mf_wire::Command;
use tracing::info;

use super::{parse_command, wait_while};
use crate::exit_error::{ExitError, EXIT_ERROR_REPLY};
use crate::output::{print_list, print_reply, OutputFormat};

#[derive(Parser)]
#[command(name = "fake-agent", version = crate::VERSION, about = "Fake management agent")]
pub struct AgentCli {
    /// IPC directory (default: $MF_IPC_DIR, then $TMPDIR/mf-ipc)
    #[arg(long, global = true)]
    pub ipc_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Serve the agent socket (and the data channel) until stopped
    Serve {
        /// Do not start the data channel proxy
        #[arg(long)]
        no_data_channel: bool,
    },
    /// List registered plugins
    ListPlugins,
    /// Show what the agent recorded for a plugin (every plugin if omitted)
    ShowPlugin { name: Option<String> },
    /// Link an appId to a plugin
    Link { app_id: String, plugin: String },
    /// Broadcast a policy to every plugin linked to an appId
    ApplyPolicy { app_id: String, policy: String },
    /// Send an action to a plugin
    DoAction {
        app_id: String,
        action: String,
        /// Required when several plugins share the appId
        #[arg(long)]
        plugin: Option<String>,
    },
    /// Ask a plugin for its latest status
    RequestStatus {
        app_id: String,
        #[arg(long)]
        plugin: Option<String>,
    },
    /// Ask a plugin for its telemetry
    RequestTelemetry { plugin: String },
    /// Store the policy returned to plugins that request one
    SetPolicy {
        app_id: String,
        #[arg(required_unless_present = "file")]
        policy: Option<String>,
        /// Read the policy from a file
        #[arg(long, conflicts_with = "policy")]
        file: Option<PathBuf>,
    },
    /// Queue a canned reply (`ACK`, `ERROR <msg>...` or content segments)
    QueueReply {
        #[arg(value_parser = parse_command)]
        command: Command,
        app_id: String,
        payload: Vec<String>,
    },
    /// Forget every registered plugin
    Deregister,
    /// Forward an arbitrary command to a plugin
    SendCustom {
        app_id: String,
        plugin: String,
        #[arg(value_parser = parse_command)]
        command: Command,
        payload: Vec<String>,
    },
    /// Stop a serving agent
    Stop,
}

pub fn run(cli: AgentCli) -> Result<()> {
    let config = crate::ipc_config(cli.ipc_dir);
    let format = cli.format;

    if let AgentCommand::Serve { no_data_channel } = cli.command {
        let mut agent = Agent::start(&config)?;
        let proxy = if no_data_channel { None } else { Some(DataChannelProxy::start(&config)?) };
        info!(endpoint = %agent.endpoint(), data_channel = proxy.is_some(), "fake agent serving");
        wait_while(config.poll_interval, || agent.is_running());
        drop(proxy);
        agent.stop();
        return Ok(());
    }

    let client = AgentClient::new(&config);
    match cli.command {
        AgentCommand::Serve { .. } => Ok(()),
        AgentCommand::ListPlugins => print_list(&client.get_registered_plugins()?, format),
        AgentCommand::ShowPlugin { name: Some(name) } => match client.registered_plugin(&name)? {
            Some(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(())
            }
            None => Err(ExitError::new(EXIT_ERROR_REPLY, format!("Plugin {name} is not registered"))
                .into()),
        },
        AgentCommand::ShowPlugin { name: None } => {
            println!("{}", serde_json::to_string_pretty(&client.registered_plugins()?)?);
            Ok(())
        }
        AgentCommand::Link { app_id, plugin } => {
            print_reply(client.link_appid_plugin(&app_id, &plugin)?, format)
        }
        AgentCommand::ApplyPolicy { app_id, policy } => {
            print_reply(client.apply_policy(&app_id, &policy)?, format)
        }
        AgentCommand::DoAction { app_id, action, plugin } => print_reply(
            client.do_action(&app_id, plugin.as_deref().unwrap_or_default(), &action)?,
            format,
        ),
        AgentCommand::RequestStatus { app_id, plugin } => print_reply(
            client.request_status(&app_id, plugin.as_deref().unwrap_or_default())?,
            format,
        ),
        AgentCommand::RequestTelemetry { plugin } => {
            print_reply(client.request_telemetry(&plugin)?, format)
        }
        AgentCommand::SetPolicy { app_id, policy, file } => {
            let reply = match (policy, file) {
                (_, Some(file)) => client.set_policy_file(&app_id, &file)?,
                (Some(policy), None) => client.set_policy(&app_id, &policy)?,
                (None, None) => anyhow::bail!("set-policy needs a policy or --file"),
            };
            print_reply(reply, format)
        }
        AgentCommand::QueueReply { command, app_id, payload } => {
            print_reply(client.queue_reply(command, &app_id, payload)?, format)
        }
        AgentCommand::Deregister => print_reply(client.deregister_plugins()?, format),
        AgentCommand::SendCustom { app_id, plugin, command, payload } => {
            print_reply(client.send_custom_message(&app_id, &plugin, command, payload)?, format)
        }
        AgentCommand::Stop => print_reply(client.stop_agent()?, format),
    }
}
