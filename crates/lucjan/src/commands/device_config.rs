//! `device-config`: show the controller's config.txt.

use tabled::Tabled;

use lucjan_api::DeviceConfig;
use lucjan_core::{CoreError, Poller, PollerConfig};

use crate::cli::{DeviceConfigArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ParamRow {
    #[tabled(rename = "Parameter")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: PollerConfig,
    args: DeviceConfigArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if args.raw {
        let text = Poller::oneshot(config, |poller| async move {
            let client = poller.client()?;
            client.get_config_raw().await.map_err(CoreError::from)
        })
        .await?;
        output::print_output(text.trim_end(), global.quiet);
        return Ok(());
    }

    let parsed: DeviceConfig = Poller::oneshot(config, |poller| async move {
        let client = poller.client()?;
        client.get_config().await.map_err(CoreError::from)
    })
    .await?;

    let params: Vec<(&str, &str)> = parsed.iter().collect();
    let out = match global.format() {
        OutputFormat::Table | OutputFormat::Plain => {
            output::render_list(
                global.format(),
                &params,
                |(name, value)| ParamRow {
                    name: (*name).to_owned(),
                    value: (*value).to_owned(),
                },
                |(name, value)| format!("{name}={value}"),
            )?
        }
        // Structured formats keep the key order of the file.
        format => output::render_single(format, &parsed, |_| String::new(), |_| String::new())?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
