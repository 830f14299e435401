// Utility helpers

/// Shorten an address for status messages: `0x74a2...5784`.
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

pub fn is_env_flag_enabled(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            normalized == "1" || normalized == "true" || normalized == "yes" || normalized == "on"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_truncates_long_values() {
        // Memastikan alamat panjang dipotong dengan ellipsis
        let short = short_address("0x74a2c6466d98253ca932fe6a6ccb811d4d7d5784");
        assert_eq!(short, "0x74a2...5784");
    }

    #[test]
    fn short_address_keeps_short_values() {
        assert_eq!(short_address("0x1234"), "0x1234");
    }
}
