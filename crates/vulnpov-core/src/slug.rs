/// Derives the container image tag for a project: the lowercased slug with `_vuln` appended.
/// Used both by the `run` Sandbox Tool (to build/run the image) and by the Engine's `setup`
/// (to remove whatever the previous run left behind) so the two always agree on one tag.
pub fn project_image_tag(project_slug: &str) -> String {
    format!("{}_vuln", project_slug.to_lowercase())
}
