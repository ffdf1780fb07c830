//! Configuration Module Tests
//!
//! ## Test Scopes
//! - **Validation**: Out-of-range values fail at build time with `ConfigValidation`.
//! - **Wire form**: `ExecutorConfig` round-trips through its binary layout.
//! - **Lookup**: Unknown policy names fall back to the default policy.
//! - **File form**: JSON configs are validated like the builder.

#[cfg(test)]
mod tests {
    use crate::config::executor::*;
    use crate::config::{ExecutorConfigs, NodeConfigFile};
    use crate::error::ClusterError;
    use crate::serialization::{ObjectDataInput, ObjectDataOutput};

    // ============================================================
    // TEST 1: Defaults
    // ============================================================

    #[test]
    fn test_default_policy_values() {
        let config = ExecutorConfig::default();

        assert_eq!(config.name(), "default");
        assert_eq!(config.core_pool_size(), 40);
        assert_eq!(config.max_pool_size(), 40);
        assert_eq!(config.capacity(), i32::MAX);
        assert_eq!(config.keep_alive_seconds(), 300);
        assert_eq!(config.executor_type(), ExecutorType::Parallel);
    }

    // ============================================================
    // TEST 2: Validation
    // ============================================================

    #[test]
    fn test_zero_max_pool_size_rejected() {
        let result = ExecutorConfig::builder("ops").max_pool_size(0).build();

        assert!(matches!(
            result,
            Err(ClusterError::ConfigValidation { ref name, .. }) if name == "ops"
        ));
    }

    #[test]
    fn test_negative_keep_alive_rejected() {
        let result = ExecutorConfig::new("ops", 1, 4, -1);

        let err = result.unwrap_err();
        assert!(matches!(err, ClusterError::ConfigValidation { .. }));
        assert!(err.to_string().contains("keepAliveSeconds"));
    }

    #[test]
    fn test_negative_core_pool_size_rejected() {
        let result = ExecutorConfig::builder("ops").core_pool_size(-1).build();

        assert!(result.is_err());
    }

    #[test]
    fn test_zero_core_pool_size_allowed() {
        let config = ExecutorConfig::new("elastic", 0, 8, 1).unwrap();

        assert_eq!(config.core_pool_size(), 0);
        assert_eq!(config.max_pool_size(), 8);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = ExecutorConfig::builder("ops").capacity(0).build();

        assert!(result.is_err());
    }

    #[test]
    fn test_failed_build_leaves_registry_untouched() {
        let mut configs = ExecutorConfigs::new();
        configs.insert(ExecutorConfig::new("queue", 2, 2, 60).unwrap());

        // ACT: try to build an invalid replacement for the same name
        let attempt = ExecutorConfig::builder("queue").max_pool_size(0).build();
        if let Ok(config) = attempt {
            configs.insert(config);
        }

        // ASSERT: the registered policy is unchanged
        assert_eq!(configs.len(), 1);
        assert_eq!(configs.resolve("queue").max_pool_size(), 2);
    }

    // ============================================================
    // TEST 3: Wire form
    // ============================================================

    #[test]
    fn test_config_wire_round_trip() {
        for executor_type in [
            ExecutorType::Parallel,
            ExecutorType::BlockingParallel,
            ExecutorType::Queued,
        ] {
            let config = ExecutorConfig::builder("backup-ops")
                .core_pool_size(3)
                .max_pool_size(7)
                .capacity(128)
                .keep_alive_seconds(15)
                .executor_type(executor_type)
                .build()
                .unwrap();

            let mut out = ObjectDataOutput::new();
            config.write_to(&mut out);
            let mut input = ObjectDataInput::new(out.into_bytes());
            let decoded = ExecutorConfig::read_from(&mut input).unwrap();

            assert_eq!(decoded, config);
            assert!(input.ensure_consumed().is_ok());
        }
    }

    #[test]
    fn test_config_wire_field_order() {
        let config = ExecutorConfig::builder("q")
            .core_pool_size(1)
            .max_pool_size(2)
            .keep_alive_seconds(3)
            .capacity(4)
            .executor_type(ExecutorType::Queued)
            .build()
            .unwrap();

        let mut out = ObjectDataOutput::new();
        config.write_to(&mut out);
        let bytes = out.into_bytes();

        let mut expected = vec![0, 0, 0, 1, b'q'];
        expected.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4]);
        expected.extend_from_slice(&[0, 0, 0, 6]);
        expected.extend_from_slice(b"Queued");
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_unknown_executor_type_on_wire() {
        let mut out = ObjectDataOutput::new();
        out.write_utf("q");
        for value in [1, 1, 1, 1] {
            out.write_i32(value);
        }
        out.write_utf("Elastic");

        let mut input = ObjectDataInput::new(out.into_bytes());
        assert!(matches!(
            ExecutorConfig::read_from(&mut input),
            Err(ClusterError::Decode(_))
        ));
    }

    #[test]
    fn test_invalid_values_on_wire_rejected() {
        let mut out = ObjectDataOutput::new();
        out.write_utf("q");
        for value in [1, 0, 1, 1] {
            out.write_i32(value);
        }
        out.write_utf("Parallel");

        let mut input = ObjectDataInput::new(out.into_bytes());
        assert!(matches!(
            ExecutorConfig::read_from(&mut input),
            Err(ClusterError::ConfigValidation { .. })
        ));
    }

    // ============================================================
    // TEST 4: Lookup with fallback
    // ============================================================

    #[test]
    fn test_unknown_name_falls_back_to_builtin_default() {
        let configs = ExecutorConfigs::new();

        let resolved = configs.resolve("anything");

        assert_eq!(resolved.name(), "anything");
        assert_eq!(resolved.max_pool_size(), 40);
        assert_eq!(resolved.executor_type(), ExecutorType::Parallel);
    }

    #[test]
    fn test_unknown_name_falls_back_to_configured_default() {
        let configs = ExecutorConfigs::new().with(ExecutorConfig::new("default", 1, 2, 10).unwrap());

        let resolved = configs.resolve("missing");

        assert_eq!(resolved.name(), "missing");
        assert_eq!(resolved.max_pool_size(), 2);
        assert!(!configs.contains("missing"));
    }

    // ============================================================
    // TEST 5: JSON file form
    // ============================================================

    #[test]
    fn test_json_config_file() {
        let json = r#"{
            "executors": [
                { "name": "queue", "core_pool_size": 2, "max_pool_size": 8,
                  "keep_alive_seconds": 30, "executor_type": "BlockingParallel" },
                { "name": "queue-backup", "max_pool_size": 1, "capacity": 100,
                  "executor_type": "Queued" }
            ],
            "queues": { "orders": { "max_size": 10 } }
        }"#;

        let file = NodeConfigFile::from_json(json).unwrap();
        let configs = file.executor_configs();

        assert_eq!(configs.names(), vec!["queue", "queue-backup"]);
        let queue = configs.resolve("queue");
        assert_eq!(queue.executor_type(), ExecutorType::BlockingParallel);
        assert_eq!(queue.capacity(), i32::MAX);
        let backup = configs.resolve("queue-backup");
        assert_eq!(backup.capacity(), 100);
        assert_eq!(backup.keep_alive_seconds(), 300);
        assert_eq!(file.queues["orders"].max_size, Some(10));
    }

    #[test]
    fn test_json_config_validated() {
        let json = r#"{ "executors": [ { "name": "bad", "max_pool_size": 0 } ] }"#;

        let err = NodeConfigFile::from_json(json).unwrap_err();
        assert!(format!("{:#}", err).contains("maxPoolSize"));
    }
}
