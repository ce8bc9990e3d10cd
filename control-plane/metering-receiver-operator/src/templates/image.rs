pub const DEFAULT_IMAGE_REGISTRY: &str = "quay.io/opencloudio";
pub const RECEIVER_IMAGE_NAME: &str = "metering-data-manager";
pub const DEFAULT_RECEIVER_IMAGE_TAG: &str = "3.6.0";

const DIGEST_PREFIX: &str = "sha256:";

/// Build an operand image reference, either `<registry>/<image>@<digest>` or
/// `<registry>/<image>:<tag><postfix>`.
///
/// `configured` is the tag or digest supplied to the operator at deploy time;
/// when absent the built-in default tag is used. The postfix never applies to
/// digests.
pub fn image_id(
    registry_override: Option<&str>,
    tag_postfix: &str,
    image: &str,
    configured: Option<&str>,
    default_tag: &str,
) -> String {
    let registry = registry_override.unwrap_or(DEFAULT_IMAGE_REGISTRY);
    match configured {
        Some(digest) if digest.starts_with(DIGEST_PREFIX) => {
            format!("{}/{}@{}", registry, image, digest)
        }
        Some(tag) => format!("{}/{}:{}{}", registry, image, tag, tag_postfix),
        None => format!("{}/{}:{}{}", registry, image, default_tag, tag_postfix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_and_tag() {
        let id = image_id(None, "", RECEIVER_IMAGE_NAME, None, "3.6.0");
        assert_eq!(id, "quay.io/opencloudio/metering-data-manager:3.6.0");
    }

    #[test]
    fn registry_override_and_postfix() {
        let id = image_id(
            Some("my.registry/ns"),
            "-ppc64le",
            RECEIVER_IMAGE_NAME,
            Some("3.7.1"),
            "3.6.0",
        );
        assert_eq!(id, "my.registry/ns/metering-data-manager:3.7.1-ppc64le");
    }

    #[test]
    fn digest_ignores_postfix() {
        let id = image_id(
            None,
            "-ppc64le",
            RECEIVER_IMAGE_NAME,
            Some("sha256:0123abcd"),
            "3.6.0",
        );
        assert_eq!(
            id,
            "quay.io/opencloudio/metering-data-manager@sha256:0123abcd"
        );
    }
}
