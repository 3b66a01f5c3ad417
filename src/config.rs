use std::time::Duration;

use crate::audio::{AudioFormat, SampleEncoding, Topology};

#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: &'static str,
    pub app_version: &'static str,

    // 声卡拓扑
    pub codec_card: u32,
    pub modem_card: u32,
    pub device: u32,
    pub pcm_prefix: &'static str,

    // 音频格式
    pub channels: u32,
    pub rate: u32,
    pub bits: u32,
    pub period_size: u32,
    pub period_count: u32,

    // 时序
    pub poll_interval_ms: u64,
    pub settle_delay_ms: u64,

    // 通话状态查询
    pub call_state_command: &'static str,
    pub max_query_failures: u32,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            app_name: env!("APP_NAME"),
            app_version: env!("APP_VERSION"),

            codec_card: env!("CODEC_CARD").parse()
                .map_err(|_| "Failed to parse CODEC_CARD")?,
            modem_card: env!("MODEM_CARD").parse()
                .map_err(|_| "Failed to parse MODEM_CARD")?,
            device: env!("PCM_DEVICE").parse()
                .map_err(|_| "Failed to parse PCM_DEVICE")?,
            pcm_prefix: env!("PCM_PREFIX"),

            channels: env!("FORMAT_CHANNELS").parse()
                .map_err(|_| "Failed to parse FORMAT_CHANNELS")?,
            rate: env!("FORMAT_RATE").parse()
                .map_err(|_| "Failed to parse FORMAT_RATE")?,
            bits: env!("FORMAT_BITS").parse()
                .map_err(|_| "Failed to parse FORMAT_BITS")?,
            period_size: env!("FORMAT_PERIOD_SIZE").parse()
                .map_err(|_| "Failed to parse FORMAT_PERIOD_SIZE")?,
            period_count: env!("FORMAT_PERIOD_COUNT").parse()
                .map_err(|_| "Failed to parse FORMAT_PERIOD_COUNT")?,

            poll_interval_ms: env!("POLL_INTERVAL_MS").parse()
                .map_err(|_| "Failed to parse POLL_INTERVAL_MS")?,
            settle_delay_ms: env!("SETTLE_DELAY_MS").parse()
                .map_err(|_| "Failed to parse SETTLE_DELAY_MS")?,

            call_state_command: env!("CALL_STATE_COMMAND"),
            max_query_failures: env!("MAX_QUERY_FAILURES").parse()
                .map_err(|_| "Failed to parse MAX_QUERY_FAILURES")?,
        })
    }

    /// Build the immutable stream format shared by all four endpoints.
    ///
    /// Only 16-bit little-endian PCM is supported on the modem path.
    pub fn audio_format(&self) -> Result<AudioFormat, &'static str> {
        let encoding = match self.bits {
            16 => SampleEncoding::S16Le,
            _ => return Err("Unsupported bit depth, only 16-bit PCM is supported"),
        };
        if self.channels == 0 || self.rate == 0 {
            return Err("Channel count and sample rate must be non-zero");
        }
        if self.period_size == 0 || self.period_count == 0 {
            return Err("Period size and period count must be non-zero");
        }

        Ok(AudioFormat {
            device: self.device,
            channels: self.channels,
            rate: self.rate,
            period_size: self.period_size,
            period_count: self.period_count,
            encoding,
        })
    }

    pub fn topology(&self) -> Topology {
        Topology {
            codec_card: self.codec_card,
            modem_card: self.modem_card,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
