use std::fmt;

use reqwest::Url;
use tracing::debug;

/// Served for references that are absent or cannot be resolved.
pub const PLACEHOLDER_URL: &str =
    "https://cloud.githubusercontent.com/assets/1567433/9781817/ecb16e82-57a0-11e5-9b43-6b4f52659997.jpg";

/// Bucket that is always available and always the largest.
const ORIGINAL_SIZE: &str = "original";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    Poster,
    Backdrop,
    Profile,
    Still,
    Logo,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetType::Poster => "poster",
            AssetType::Backdrop => "backdrop",
            AssetType::Profile => "profile",
            AssetType::Still => "still",
            AssetType::Logo => "logo",
        };
        f.write_str(name)
    }
}

/// Base URL and size buckets of the image service.
#[derive(Debug, Clone)]
pub struct ImageConfiguration {
    base_url: String,
    backdrop_sizes: Vec<String>,
    logo_sizes: Vec<String>,
    poster_sizes: Vec<String>,
    profile_sizes: Vec<String>,
    still_sizes: Vec<String>,
}

fn sizes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ImageConfiguration {
    fn default() -> Self {
        Self::with_base_url("https://image.tmdb.org/t/p/")
    }
}

impl ImageConfiguration {
    pub fn with_base_url(base_url: &str) -> Self {
        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            backdrop_sizes: sizes(&["w300", "w780", "w1280", "original"]),
            logo_sizes: sizes(&["w45", "w92", "w154", "w185", "w300", "w500", "original"]),
            poster_sizes: sizes(&["w92", "w154", "w185", "w342", "w500", "w780", "original"]),
            profile_sizes: sizes(&["w45", "w185", "h632", "original"]),
            still_sizes: sizes(&["w92", "w185", "w300", "original"]),
        }
    }

    fn sizes(&self, asset_type: AssetType) -> &[String] {
        match asset_type {
            AssetType::Backdrop => &self.backdrop_sizes,
            AssetType::Logo => &self.logo_sizes,
            AssetType::Poster => &self.poster_sizes,
            AssetType::Profile => &self.profile_sizes,
            AssetType::Still => &self.still_sizes,
        }
    }

    /// Smallest width bucket >= `desired_width`, else the largest bucket.
    ///
    /// Only `w`-prefixed buckets are width buckets; `h632` style entries are
    /// never picked by width.
    pub fn size_for(&self, asset_type: AssetType, desired_width: Option<u32>) -> &str {
        let sizes = self.sizes(asset_type);
        let largest = sizes.last().map(String::as_str).unwrap_or(ORIGINAL_SIZE);
        let Some(desired) = desired_width else {
            return largest;
        };

        sizes
            .iter()
            .filter_map(|s| {
                let width = s.strip_prefix('w')?.parse::<u32>().ok()?;
                Some((width, s.as_str()))
            })
            .filter(|(width, _)| *width >= desired)
            .min_by_key(|(width, _)| *width)
            .map(|(_, s)| s)
            .unwrap_or(largest)
    }

    /// Map a logical reference (a relative path such as `/abc.jpg`) to a URL.
    pub fn resolve(
        &self,
        reference: Option<&str>,
        asset_type: AssetType,
        desired_width: Option<u32>,
    ) -> String {
        let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            return PLACEHOLDER_URL.to_string();
        };

        // Already a full URL (some payloads carry absolute logo links).
        if let Ok(url) = Url::parse(reference) {
            if matches!(url.scheme(), "http" | "https") {
                return url.to_string();
            }
            debug!(reference, "Unsupported asset reference scheme");
            return PLACEHOLDER_URL.to_string();
        }

        let size = self.size_for(asset_type, desired_width);
        let candidate = format!("{}{}/{}", self.base_url, size, reference.trim_start_matches('/'));
        match Url::parse(&candidate) {
            Ok(url) => url.to_string(),
            Err(e) => {
                debug!(reference, error = %e, "Unresolvable asset reference");
                PLACEHOLDER_URL.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_for_picks_smallest_fitting_bucket() {
        let config = ImageConfiguration::default();
        assert_eq!(config.size_for(AssetType::Poster, Some(100)), "w154");
        assert_eq!(config.size_for(AssetType::Poster, Some(154)), "w154");
        assert_eq!(config.size_for(AssetType::Backdrop, Some(1)), "w300");
        assert_eq!(config.size_for(AssetType::Still, Some(300)), "w300");
    }

    #[test]
    fn test_size_for_defaults_to_largest() {
        let config = ImageConfiguration::default();
        assert_eq!(config.size_for(AssetType::Poster, None), "original");
        assert_eq!(config.size_for(AssetType::Logo, Some(5000)), "original");
    }

    #[test]
    fn test_size_for_skips_height_buckets() {
        let config = ImageConfiguration::default();
        assert_eq!(config.size_for(AssetType::Profile, Some(200)), "original");
        assert_eq!(config.size_for(AssetType::Profile, Some(100)), "w185");
    }

    #[test]
    fn test_resolve_builds_url() {
        let config = ImageConfiguration::default();
        assert_eq!(
            config.resolve(Some("/kqjL17yufvn9OVLyXYpvtyrFfak.jpg"), AssetType::Poster, Some(342)),
            "https://image.tmdb.org/t/p/w342/kqjL17yufvn9OVLyXYpvtyrFfak.jpg"
        );
        assert_eq!(
            config.resolve(Some("/bg.jpg"), AssetType::Backdrop, None),
            "https://image.tmdb.org/t/p/original/bg.jpg"
        );
    }

    #[test]
    fn test_resolve_falls_back_to_placeholder() {
        let config = ImageConfiguration::default();
        assert_eq!(config.resolve(None, AssetType::Poster, None), PLACEHOLDER_URL);
        assert_eq!(config.resolve(Some("   "), AssetType::Logo, None), PLACEHOLDER_URL);
        assert_eq!(config.resolve(Some("ftp://x/y.png"), AssetType::Logo, None), PLACEHOLDER_URL);
    }

    #[test]
    fn test_resolve_passes_through_absolute_urls() {
        let config = ImageConfiguration::with_base_url("https://cdn.example.test/img");
        assert_eq!(
            config.resolve(Some("https://other.test/logo.png"), AssetType::Logo, Some(45)),
            "https://other.test/logo.png"
        );
        assert_eq!(
            config.resolve(Some("/a.png"), AssetType::Logo, Some(45)),
            "https://cdn.example.test/img/w45/a.png"
        );
    }
}
