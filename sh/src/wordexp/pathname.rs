//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use crate::pattern::FilenamePattern;
use crate::utils::strcoll;
use std::ffi::{CString, OsString};
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
enum DirEntry {
    File(OsString),
    Dir(OsString),
}

type DirContent = Vec<DirEntry>;

trait FileSystem {
    fn read_dir(&self, path: &Path) -> DirContent;
}

struct DefaultFileSystem;

impl FileSystem for DefaultFileSystem {
    fn read_dir(&self, path: &Path) -> DirContent {
        let mut result = vec![DirEntry::Dir(".".into()), DirEntry::Dir("..".into())];
        let dir_iter = match std::fs::read_dir(path) {
            Ok(iter) => iter,
            _ => return result,
        };
        for entry in dir_iter {
            let Ok(entry) = entry else { continue };
            let Ok(mut file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_symlink() {
                // classify symlinks by their target; skip broken links
                match std::fs::metadata(entry.path()) {
                    Ok(metadata) => file_type = metadata.file_type(),
                    Err(_) => continue,
                }
            }
            if file_type.is_dir() {
                result.push(DirEntry::Dir(entry.file_name()))
            } else {
                result.push(DirEntry::File(entry.file_name()))
            }
        }
        result
    }
}

fn list_files_rec(
    filesystem: &dyn FileSystem,
    pattern: &FilenamePattern,
    depth: usize,
    current_directory: &mut PathBuf,
    prefix: &mut PathBuf,
    result: &mut Vec<OsString>,
) {
    let add_to_result = depth == pattern.component_count();
    for entry in filesystem.read_dir(current_directory) {
        match entry {
            DirEntry::File(file_name) if add_to_result => {
                // file names never contain a null byte, this is safe
                let file_name_cstring =
                    CString::new(file_name.clone().into_encoded_bytes()).unwrap();
                if pattern.matches_component(depth, &file_name_cstring) {
                    let mut path = prefix.clone();
                    path.push(file_name);
                    result.push(path.into_os_string());
                }
            }
            DirEntry::Dir(dir_name) => {
                let dir_name_cstring =
                    CString::new(dir_name.clone().into_encoded_bytes()).unwrap();
                if pattern.matches_component(depth, &dir_name_cstring) {
                    let previous_prefix = prefix.clone();
                    prefix.push(&dir_name);
                    if add_to_result {
                        result.push(prefix.clone().into_os_string());
                    } else {
                        let previous_directory = current_directory.clone();
                        current_directory.push(&dir_name);
                        list_files_rec(
                            filesystem,
                            pattern,
                            depth + 1,
                            current_directory,
                            prefix,
                            result,
                        );
                        *current_directory = previous_directory;
                    }
                    *prefix = previous_prefix;
                }
            }
            _ => {}
        }
    }
}

fn list_files(
    filesystem: &dyn FileSystem,
    pattern: &FilenamePattern,
    current_directory: &Path,
) -> Vec<OsString> {
    if pattern.component_count() == 0 {
        return Vec::new();
    }

    let mut result = Vec::new();
    if pattern.is_absolute() {
        list_files_rec(
            filesystem,
            pattern,
            1,
            &mut PathBuf::from("/"),
            &mut PathBuf::from("/"),
            &mut result,
        );
    } else {
        list_files_rec(
            filesystem,
            pattern,
            1,
            &mut PathBuf::from(current_directory),
            &mut PathBuf::new(),
            &mut result,
        );
    }

    if result.len() <= 1 {
        result
    } else {
        let mut entries = result
            .into_iter()
            // file names never contain a null byte, this is safe
            .map(|entry| CString::new(entry.into_vec()).unwrap())
            .collect::<Vec<_>>();
        entries.sort_by(|lhs, rhs| strcoll(lhs, rhs));
        entries
            .into_iter()
            .map(|entry| OsString::from_vec(entry.into_bytes()))
            .collect()
    }
}

/// Lists the files matching `pattern`, relative patterns starting from
/// `starting_directory`. Results are in collation order.
///
/// # Panics
/// Panics if `starting_directory` is not an absolute path.
pub fn glob(pattern: &FilenamePattern, starting_directory: &Path) -> Vec<OsString> {
    assert!(starting_directory.is_absolute());
    list_files(&DefaultFileSystem, pattern, starting_directory)
}
