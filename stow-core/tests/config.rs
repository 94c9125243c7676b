#[cfg(test)]
mod tests {
    use std::time::Duration;
    use stow_core::Config;

    #[test]
    fn defaults() {
        let config = Config::new("Server=localhost;Database=Logs");
        assert_eq!(config.connection_string, "Server=localhost;Database=Logs");
        assert_eq!(config.command_timeout, Duration::from_secs(30));
        assert_eq!(config.bulk_timeout_factor, 3);
        assert_eq!(config.bulk_timeout(), Duration::from_secs(90));
        assert_eq!(Config::default().connection_string, "");
    }

    #[test]
    fn builders() {
        let config = Config::new("db")
            .with_command_timeout(Duration::from_millis(1500))
            .with_bulk_timeout_factor(4);
        assert_eq!(config.bulk_timeout(), Duration::from_secs(6));
        let config = config.with_bulk_timeout_factor(0);
        assert_eq!(config.bulk_timeout_factor, 1);
        assert_eq!(config.bulk_timeout(), Duration::from_millis(1500));
        let config = Config::new("db").with_command_timeout(Duration::MAX);
        assert_eq!(config.bulk_timeout(), Duration::MAX);
    }
}
