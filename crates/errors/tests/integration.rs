//! Integration tests for error types

#[cfg(test)]
mod tests {
    use vernal_errors::*;

    #[test]
    fn test_error_conversion() {
        let net_err = NetworkError::Timeout {
            url: "https://example.com".into(),
        };
        let err: Error = net_err.into();
        assert!(matches!(err, Error::Network(_)));
    }

    #[test]
    fn test_server_rejection_is_passed_through() {
        let err: Error = InstallError::ServerRejected {
            message: "Email and password are not valid".into(),
        }
        .into();
        assert_eq!(err.user_message(), "Email and password are not valid");
        assert!(err.user_detail().is_none());
    }

    #[test]
    fn test_archive_failure_rendering() {
        let err: Error = InstallError::ArchiveFailed {
            exit_code: 1,
            diagnostics: "tar: Error opening archive: Unrecognized archive format\n".into(),
        }
        .into();
        assert_eq!(err.user_message(), "Failed to install with exit code: 1");
        assert_eq!(
            err.user_detail().as_deref(),
            Some("tar: Error opening archive: Unrecognized archive format\n")
        );
        assert_eq!(err.user_code(), Some("install.archive_failed"));
    }

    #[test]
    fn test_cancellation_detection() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(Error::from(InstallError::Cancelled).is_cancelled());
        assert!(!Error::internal("boom").is_cancelled());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test");
        let err = Error::io_with_path(&io_err, "/tmp/vernal");
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                ..
            }
        ));
        assert_eq!(err.user_detail().as_deref(), Some("/tmp/vernal"));
    }

    #[test]
    fn test_retryable_http_errors() {
        let server_side = NetworkError::HttpError {
            status: 503,
            message: "Service Unavailable".into(),
        };
        let client_side = NetworkError::HttpError {
            status: 404,
            message: "Not Found".into(),
        };
        assert!(server_side.is_retryable());
        assert!(!client_side.is_retryable());
    }
}
