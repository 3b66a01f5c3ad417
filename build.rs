use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    application: Application,
    topology: Topology,
    format: Format,
    timing: Timing,
    call_state: CallState,
}

#[derive(Deserialize)]
struct Application {
    name: String,
    version: String,
}

#[derive(Deserialize)]
struct Topology {
    codec_card: u32,
    modem_card: u32,
    device: u32,
    pcm_prefix: String,
}

#[derive(Deserialize)]
struct Format {
    channels: u32,
    rate: u32,
    bits: u32,
    period_size: u32,
    period_count: u32,
}

#[derive(Deserialize)]
struct Timing {
    poll_interval_ms: u64,
    settle_delay_ms: u64,
}

#[derive(Deserialize)]
struct CallState {
    command: String,
    max_query_failures: u32,
}


// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // 应用信息
    println!("cargo:rustc-env=APP_NAME={}", config.application.name);
    println!("cargo:rustc-env=APP_VERSION={}", config.application.version);

    // 声卡拓扑
    println!("cargo:rustc-env=CODEC_CARD={}", config.topology.codec_card);
    println!("cargo:rustc-env=MODEM_CARD={}", config.topology.modem_card);
    println!("cargo:rustc-env=PCM_DEVICE={}", config.topology.device);
    println!("cargo:rustc-env=PCM_PREFIX={}", config.topology.pcm_prefix);

    // 音频格式
    println!("cargo:rustc-env=FORMAT_CHANNELS={}", config.format.channels);
    println!("cargo:rustc-env=FORMAT_RATE={}", config.format.rate);
    println!("cargo:rustc-env=FORMAT_BITS={}", config.format.bits);
    println!("cargo:rustc-env=FORMAT_PERIOD_SIZE={}", config.format.period_size);
    println!("cargo:rustc-env=FORMAT_PERIOD_COUNT={}", config.format.period_count);

    // 时序
    println!("cargo:rustc-env=POLL_INTERVAL_MS={}", config.timing.poll_interval_ms);
    println!("cargo:rustc-env=SETTLE_DELAY_MS={}", config.timing.settle_delay_ms);

    // 通话状态查询
    println!("cargo:rustc-env=CALL_STATE_COMMAND={}", config.call_state.command);
    println!("cargo:rustc-env=MAX_QUERY_FAILURES={}", config.call_state.max_query_failures);
}
