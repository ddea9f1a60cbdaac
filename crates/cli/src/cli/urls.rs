use cu_domain::catalog::{self, Platform, ReleaseSpec};

pub fn configs(env: &str) -> anyhow::Result<()> {
    for url in catalog::config_urls(env)? {
        println!("{url}");
    }
    println!("token metadata server: {}", catalog::token_metadata_server(env));
    Ok(())
}

pub fn binary(release: &str) -> anyhow::Result<()> {
    let parsed = ReleaseSpec::parse(release)?;
    println!("{}", catalog::binary_url(&parsed, Platform::current())?);
    Ok(())
}
