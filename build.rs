//! Retrieves information about the version of the tool from Git and the build
//! environment so that benchmark reports can be traced back to the exact
//! binary that produced them.

fn main() -> shadow_rs::SdResult<()> {
    shadow_rs::new()
}
