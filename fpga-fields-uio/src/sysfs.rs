//! Map geometry published by the UIO class in sysfs.

use std::fs;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use snafu::{OptionExt, ResultExt};

use crate::error::{DeviceNameSnafu, MapSizeParseSnafu, MapSizeReadSnafu, UioError};

/// Parses a map size attribute. The value is always hexadecimal; the `0x` prefix is optional.
pub fn parse_map_size(text: &str) -> Result<usize, ParseIntError> {
    let text = text.trim();
    let hex = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")).unwrap_or(text);
    usize::from_str_radix(hex, 16)
}

/// Returns the path of the size attribute of map `map_index` of `device`.
pub fn map_size_path(sysfs_root: &Path, device: &Path, map_index: usize) -> Result<PathBuf, UioError> {
    let name = device.file_name().context(DeviceNameSnafu { path: device })?;
    Ok(sysfs_root
        .join(name)
        .join("maps")
        .join(format!("map{map_index}"))
        .join("size"))
}

/// Reads the size in bytes of map `map_index` of `device`.
pub fn map_size(sysfs_root: &Path, device: &Path, map_index: usize) -> Result<usize, UioError> {
    let path = map_size_path(sysfs_root, device, map_index)?;
    let text = fs::read_to_string(&path).with_context(|_| MapSizeReadSnafu { path: path.clone() })?;
    parse_map_size(&text).with_context(|_| MapSizeParseSnafu {
        path: path.clone(),
        text: text.trim(),
    })
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("fpga-fields-uio-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_map_size() {
        assert_eq!(parse_map_size("0x00001000\n").unwrap(), 0x1000);
        assert_eq!(parse_map_size("0X20").unwrap(), 0x20);
        // Unprefixed sizes are hex too.
        assert_eq!(parse_map_size("4096").unwrap(), 0x4096);
        assert_eq!(parse_map_size("  1000 \n").unwrap(), 0x1000);
        assert_eq!(parse_map_size("ffff").unwrap(), 0xffff);
        assert!(parse_map_size("0x").is_err());
        assert!(parse_map_size("").is_err());
        assert!(parse_map_size("1000h").is_err());
    }

    #[test]
    fn test_map_size_path() {
        assert_eq!(
            map_size_path(Path::new("/sys/class/uio"), Path::new("/dev/uio4"), 1).unwrap(),
            Path::new("/sys/class/uio/uio4/maps/map1/size"),
        );
        assert!(matches!(
            map_size_path(Path::new("/sys/class/uio"), Path::new("/"), 0),
            Err(UioError::DeviceName { .. }),
        ));
    }

    #[test]
    fn test_map_size() {
        let root = scratch_dir("map-size");
        let map = root.join("uio7/maps/map0");
        fs::create_dir_all(&map).unwrap();
        fs::write(map.join("size"), "0x00010000\n").unwrap();
        assert_eq!(map_size(&root, Path::new("/dev/uio7"), 0).unwrap(), 0x10000);

        assert!(matches!(
            map_size(&root, Path::new("/dev/uio7"), 1),
            Err(UioError::MapSizeRead { .. }),
        ));

        fs::write(map.join("size"), "lots\n").unwrap();
        match map_size(&root, Path::new("/dev/uio7"), 0) {
            Err(UioError::MapSizeParse { text, .. }) => assert_eq!(text, "lots"),
            other => panic!("unexpected result: {other:?}"),
        }
        fs::remove_dir_all(&root).unwrap();
    }
}
