// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use dirs::home_dir;

/// Directory holding downloaded model weights
///
/// Set by the `SORREL_CACHE` environment variable, otherwise `~/.sorrel_cache`.
pub fn get_sorrel_cache() -> std::path::PathBuf {
    if let Ok(sorrel_cache) = std::env::var("SORREL_CACHE") {
        if !sorrel_cache.is_empty() {
            return std::path::PathBuf::from(sorrel_cache);
        }
    }

    if let Some(home) = home_dir() {
        return home.join(".sorrel_cache");
    }

    std::path::PathBuf::from("/.sorrel_cache")
}

pub mod data;
pub mod request;

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_cache_from_env() {
        let previous = std::env::var("SORREL_CACHE").ok();

        unsafe { std::env::set_var("SORREL_CACHE", "/tmp/sorrel_cache_test") };
        assert_eq!(
            get_sorrel_cache(),
            std::path::PathBuf::from("/tmp/sorrel_cache_test")
        );

        unsafe { std::env::set_var("SORREL_CACHE", "") };
        assert!(get_sorrel_cache().ends_with(".sorrel_cache"));

        match previous {
            Some(value) => unsafe { std::env::set_var("SORREL_CACHE", value) },
            None => unsafe { std::env::remove_var("SORREL_CACHE") },
        }
    }
}
