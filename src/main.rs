mod audio;
mod bridge;
mod call_monitor;
mod call_state;
mod config;
mod error;
#[cfg(test)]
mod test_support;

use audio::AlsaBackend;
use bridge::BridgeSettings;
use call_monitor::{CallMonitor, MonitorTiming, ThreadSleeper};
use call_state::DumpsysCallState;
use config::Config;

fn main() -> anyhow::Result<()> {
    // 初始化日志，默认 info 级别，可通过 RUST_LOG 覆盖
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 加载编译期配置
    let config = Config::new().map_err(anyhow::Error::msg)?;
    let format = config.audio_format().map_err(anyhow::Error::msg)?;

    log::info!(
        "{} {} started: codec card {}, modem card {}, device {}, {} ch / {} Hz / {} bit, period {} x {}",
        config.app_name,
        config.app_version,
        config.codec_card,
        config.modem_card,
        format.device,
        format.channels,
        format.rate,
        format.bits(),
        format.period_size,
        format.period_count,
    );

    let settings = BridgeSettings {
        topology: config.topology(),
        format,
        max_query_failures: config.max_query_failures,
    };
    let timing = MonitorTiming {
        poll_interval: config.poll_interval(),
        settle_delay: config.settle_delay(),
    };

    let mut monitor = CallMonitor::new(
        DumpsysCallState::new(config.call_state_command),
        AlsaBackend::new(config.pcm_prefix),
        ThreadSleeper,
        settings,
        timing,
    );
    monitor.run()
}
