use batch_transform_core::WorkItem;
use std::path::{Path, PathBuf};

/// Output location for `item`.
///
/// With `preserve_structure` the item's path relative to `source_root` is
/// recreated under `output_root`; otherwise the file lands directly in
/// `output_root` under its base name. Pure function of its inputs.
pub fn mirror_output_path(
    source_root: &Path,
    item: &WorkItem,
    output_root: &Path,
    preserve_structure: bool,
) -> PathBuf {
    if !preserve_structure {
        return output_root.join(item.file_name());
    }

    match item.source.strip_prefix(source_root) {
        Ok(relative) if !relative.as_os_str().is_empty() => output_root.join(relative),
        _ => output_root.join(item.relative_path()),
    }
}

/// Output placement rules for one pass
#[derive(Debug, Clone)]
pub struct OutputPlacement {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub preserve_structure: bool,
}

impl OutputPlacement {
    pub fn locate(&self, item: &WorkItem) -> PathBuf {
        mirror_output_path(
            &self.source_root,
            item,
            &self.output_root,
            self.preserve_structure,
        )
    }
}
