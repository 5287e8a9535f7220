//! Integration tests for types

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::str::FromStr;
    use vernal_types::layout::{ARCHIVE_FILE_NAME, CONFIG_FILE_NAME, PAYLOAD_DIR_NAME};
    use vernal_types::server::login_url;
    use vernal_types::*;

    const SUCCESS_BODY: &str = r#"{
        "message": {
            "download_url": "https://downloads.example.com/vernal_falls-1.2.3.tar.gz",
            "vernal_falls_version": "1.2.3"
        },
        "vernal_falls_config": {"b": "2", "a": "1"},
        "org": {
            "id": 42,
            "name": "Sparta",
            "logo_url": "https://example.com/logo.png",
            "touch_icon_url": null
        }
    }"#;

    #[test]
    fn test_decode_success_response() {
        let response = LoginResponse::from_slice(SUCCESS_BODY.as_bytes()).unwrap();
        let LoginResponse::Success(success) = response else {
            panic!("expected success, got {response:?}");
        };
        assert_eq!(success.message.distribution_version, "1.2.3");
        assert_eq!(
            success.message.download_url.as_str(),
            "https://downloads.example.com/vernal_falls-1.2.3.tar.gz"
        );
        assert_eq!(success.organization.id, 42);
        assert_eq!(success.organization.touch_icon_url, None);
        let keys: Vec<_> = success.config.keys().cloned().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_decode_failure_response() {
        let response = LoginResponse::from_slice(br#"{"error": "Invalid credentials"}"#).unwrap();
        assert_eq!(
            response,
            LoginResponse::Failure(LoginFailure {
                error: "Invalid credentials".to_string()
            })
        );
    }

    #[test]
    fn test_decode_neither_shape_reports_success_mismatch() {
        // Success-like payload with a broken download URL must not turn into a failure.
        let body = br#"{
            "message": {"download_url": "not a url", "vernal_falls_version": "1"},
            "vernal_falls_config": {},
            "org": {"id": 1, "name": "x"}
        }"#;
        let err = LoginResponse::from_slice(body).unwrap_err();
        assert!(
            err.to_string().contains("not a valid success payload"),
            "unexpected error: {err}"
        );

        assert!(LoginResponse::from_slice(b"[]").is_err());
        assert!(LoginResponse::from_slice(b"not json").is_err());
    }

    #[test]
    fn test_layout_paths() {
        let layout = InstallationLayout::new("/Users/me/Library/Application Support/vernal");
        assert_eq!(layout.config_file(), layout.root().join(CONFIG_FILE_NAME));
        assert_eq!(layout.archive_file(), layout.root().join(ARCHIVE_FILE_NAME));
        assert_eq!(layout.payload_dir(), layout.root().join(PAYLOAD_DIR_NAME));
        assert_eq!(CONFIG_FILE_NAME, "config.yml");
        assert_eq!(ARCHIVE_FILE_NAME, "vernal_falls.tar.gz");
        assert_eq!(PAYLOAD_DIR_NAME, "vernal_falls");
    }

    #[test]
    fn test_service_command_arguments() {
        let label = "sparta_science.vernal_falls";
        let descriptor = "sparta_science.vernal_falls.plist";

        assert_eq!(ServiceCommand::Start.verb(), "bootstrap");
        assert_eq!(
            ServiceCommand::Start.arguments(501, label, descriptor),
            vec!["gui/501", "sparta_science.vernal_falls.plist"]
        );
        assert_eq!(ServiceCommand::Stop.verb(), "bootout");
        assert_eq!(
            ServiceCommand::Stop.arguments(501, label, descriptor),
            vec!["gui/501/sparta_science.vernal_falls"]
        );
    }

    #[test]
    fn test_service_command_ignore_sets() {
        assert!(ServiceCommand::Start.ignores(libc::EALREADY));
        assert!(!ServiceCommand::Start.ignores(libc::ESRCH));
        assert!(ServiceCommand::Stop.ignores(libc::ESRCH));
        assert!(ServiceCommand::Stop.ignores(libc::EINPROGRESS));
        assert!(!ServiceCommand::Stop.ignores(libc::EALREADY));
        assert!(!ServiceCommand::Stop.ignores(1));
    }

    #[test]
    fn test_server_catalogue() {
        let names: Vec<_> = ApiServer::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["localhost", "offline", "staging", "production"]);
        assert_eq!(ApiServer::Offline.display_name(), "Sparta Offline System");
        assert_eq!(ApiServer::Production.display_name(), "home.spartascience.com");
        assert_eq!(ApiServer::Staging.display_name(), "staging");
        assert_eq!(
            ApiServer::from_str("Production").unwrap(),
            ApiServer::Production
        );
        assert!(ApiServer::from_str("moon").is_err());
    }

    #[test]
    fn test_production_url_override() {
        let url = ApiServer::Production
            .resolve_base_url(Some("https://override.example.com"))
            .unwrap();
        assert_eq!(url.as_str(), "https://override.example.com/");

        let url = ApiServer::Staging.resolve_base_url(None).unwrap();
        assert_eq!(url.as_str(), "https://staging.spartascience.com/");

        let url = ApiServer::Staging.resolve_base_url(Some("  ")).unwrap();
        assert_eq!(url.as_str(), "https://staging.spartascience.com/");

        assert!(ApiServer::Production.resolve_base_url(Some("::")).is_err());
    }

    #[test]
    fn test_login_url() {
        let url = login_url(&ApiServer::Production.base_url().unwrap());
        assert_eq!(url.as_str(), "https://home.spartascience.com/api/app-setup");

        let base = Url::parse("http://localhost:4000/prefix/").unwrap();
        assert_eq!(
            login_url(&base).as_str(),
            "http://localhost:4000/prefix/api/app-setup"
        );
    }

    proptest! {
        #[test]
        fn prop_user_id_lands_in_domain(user in any::<u32>()) {
            let start = ServiceCommand::Start.arguments(user, "l", "d");
            let stop = ServiceCommand::Stop.arguments(user, "l", "d");
            prop_assert_eq!(&start[0], &format!("gui/{user}"));
            prop_assert_eq!(&stop[0], &format!("gui/{user}/l"));
        }
    }
}
