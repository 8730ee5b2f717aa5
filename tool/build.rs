use anyhow::Result;

fn main() -> Result<()> {
    println!("cargo:rerun-if-env-changed=TOOL_VERSION");

    let version = match std::env::var("TOOL_VERSION") {
        Ok(value) => value,
        _ => match describe() {
            Ok(desc) => desc,
            // Source tarballs and untagged checkouts have nothing to describe.
            Err(_) => std::env::var("CARGO_PKG_VERSION")?,
        },
    };

    println!("cargo:rustc-env=TOOL_VERSION={version}");

    Ok(())
}

fn describe() -> Result<String> {
    let dir = std::env::current_dir()?;
    let repo = git2::Repository::discover(dir)?;
    let mut desc_opts = git2::DescribeOptions::new();
    desc_opts.describe_tags();
    let desc = repo.describe(&desc_opts)?;
    let mut fmt_opts = git2::DescribeFormatOptions::new();
    fmt_opts.dirty_suffix("-dirty");
    Ok(desc.format(Some(&fmt_opts))?)
}
