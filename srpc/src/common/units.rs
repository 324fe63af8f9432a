// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Human-readable sizes and durations for the conf files: "5ms", "30s",
//! "64KB", "16MB". A bare number means milliseconds or bytes.

#![allow(clippy::should_implement_trait)]

use crate::{err_box, CommonResult};
use std::time::Duration;

fn split_number(str: &str) -> (&str, &str) {
    let pos = str
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(str.len());
    str.split_at(pos)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationUnit {
    millis: u64,
}

impl DurationUnit {
    pub fn from_str(str: &str) -> CommonResult<Self> {
        let str = str.trim().to_ascii_lowercase();
        if str.is_empty() {
            return err_box!("Empty duration string");
        }

        let (num, unit) = split_number(&str);
        let value: u64 = num.parse()?;

        let millis = match unit {
            "" | "ms" => value,
            "s" => value * 1000,
            "m" | "min" => value * 60 * 1000,
            "h" => value * 3600 * 1000,
            "d" => value * 24 * 3600 * 1000,
            _ => return err_box!("Unknown duration unit: {}", unit),
        };

        Ok(Self { millis })
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteUnit {
    bytes: u64,
}

impl ByteUnit {
    pub const KB: u64 = 1024;
    pub const MB: u64 = 1024 * Self::KB;
    pub const GB: u64 = 1024 * Self::MB;

    pub fn from_str(str: &str) -> CommonResult<Self> {
        let str = str.trim().to_ascii_uppercase();
        if str.is_empty() {
            return err_box!("Empty byte size string");
        }

        let (num, unit) = split_number(&str);
        let value: u64 = num.parse()?;

        let bytes = match unit {
            "" | "B" => value,
            "K" | "KB" => value * Self::KB,
            "M" | "MB" => value * Self::MB,
            "G" | "GB" => value * Self::GB,
            _ => return err_box!("Unknown byte unit: {}", unit),
        };

        Ok(Self { bytes })
    }

    pub fn as_byte(&self) -> u64 {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use crate::common::{ByteUnit, DurationUnit};

    #[test]
    fn durations() {
        assert_eq!(DurationUnit::from_str("5ms").unwrap().as_millis(), 5);
        assert_eq!(DurationUnit::from_str("30s").unwrap().as_millis(), 30_000);
        assert_eq!(DurationUnit::from_str("10m").unwrap().as_millis(), 600_000);
        assert_eq!(DurationUnit::from_str("100").unwrap().as_millis(), 100);
        assert!(DurationUnit::from_str("1x").is_err());
        assert!(DurationUnit::from_str("").is_err());
    }

    #[test]
    fn byte_sizes() {
        assert_eq!(ByteUnit::from_str("512").unwrap().as_byte(), 512);
        assert_eq!(ByteUnit::from_str("64KB").unwrap().as_byte(), 64 * 1024);
        assert_eq!(
            ByteUnit::from_str("16MB").unwrap().as_byte(),
            16 * 1024 * 1024
        );
        assert!(ByteUnit::from_str("1TBx").is_err());
    }
}
