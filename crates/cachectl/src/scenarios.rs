//! The four canonical memoization scenarios

use std::sync::Arc;

use anyhow::{anyhow, Result};
use cacheable::{json, CacheConfig, CacheKey, CacheableOptions, Class, Object, Value};
use clap::Subcommand;
use tracing::info;

use crate::github::{StarSource, FAST_GROWTH};

const STAR_COUNT: &str = "star_count";

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Cache a method, hit it, clear it
    Simple,
    /// Skip the cache for repositories that grow fast
    Conditional,
    /// Key entries by the repository argument
    CustomKey,
    /// Cache a method on a class-level receiver
    ClassMethod,
    /// Run every scenario in order
    All,
}

impl Scenario {
    /// Run the scenario; returns how many requests reached the star source
    pub fn run(self, config: &CacheConfig) -> Result<u64> {
        let source = Arc::new(StarSource::new());
        match self {
            Scenario::Simple => simple(config, &source)?,
            Scenario::Conditional => conditional(config, &source)?,
            Scenario::CustomKey => custom_key(config, &source)?,
            Scenario::ClassMethod => class_method(config, &source)?,
            Scenario::All => {
                simple(config, &source)?;
                conditional(config, &source)?;
                custom_key(config, &source)?;
                class_method(config, &source)?;
            }
        }
        Ok(source.requests())
    }
}

/// Receiver state: which repository, and where stars come from
pub struct Repo {
    name: String,
    source: Arc<StarSource>,
}

impl Repo {
    fn new(name: &str, source: &Arc<StarSource>) -> Self {
        Self {
            name: name.to_string(),
            source: Arc::clone(source),
        }
    }
}

fn api_class(name: &str) -> Arc<Class<Repo>> {
    let class = Class::<Repo>::new(name);
    class.define(STAR_COUNT, |this, _| {
        let repo = this.state();
        Ok(repo.source.fetch(&repo.name))
    });
    class.define("growing_fast?", |this, _| {
        let repo = this.state();
        Ok(json!(repo.source.growth(&repo.name) >= FAST_GROWTH))
    });
    class
}

fn options(config: &CacheConfig) -> Result<CacheableOptions<Repo>> {
    Ok(config.options_for(STAR_COUNT)?)
}

fn report(label: &str, value: &Value) {
    println!(
        "  {:<14} {} stars (fetched at {})",
        label, value["stars"], value["fetched_at"]
    );
}

fn banner(title: &str) {
    println!("\n== {} ==", title);
}

fn simple(config: &CacheConfig, source: &Arc<StarSource>) -> Result<()> {
    banner("simple");
    let class = api_class("GitHubApi");
    class.cacheable(&[STAR_COUNT], options(config)?)?;

    let client = class.instance(Repo::new("cacheable/cacheable", source));
    report("first call", &client.call(STAR_COUNT, &[])?);
    report("second call", &client.call(STAR_COUNT, &[])?);
    println!("  key: {}", client.call("star_count_key_format", &[])?);

    let cleared = client.call("clear_star_count_cache", &[])?;
    println!("  cleared: {}", cleared);
    report("after clear", &client.call(STAR_COUNT, &[])?);
    Ok(())
}

fn conditional(config: &CacheConfig, source: &Arc<StarSource>) -> Result<()> {
    banner("conditional");
    let class = api_class("TrendingApi");
    class.cacheable(&[STAR_COUNT], options(config)?.unless_method("growing_fast?"))?;

    for name in ["rails/rails", "cacheable/cacheable"] {
        let client = class.instance(Repo::new(name, source));
        let bypass = client.call("growing_fast?", &[])?;
        println!("  {} (growing fast: {})", name, bypass);
        report("first call", &client.call(STAR_COUNT, &[])?);
        report("second call", &client.call(STAR_COUNT, &[])?);
        client.clear_cache(STAR_COUNT, &[])?;
    }
    Ok(())
}

fn repo_argument(args: &[Value]) -> Result<&str> {
    args.first()
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("star_count expects a repository name"))
}

fn custom_key(config: &CacheConfig, source: &Arc<StarSource>) -> Result<()> {
    banner("custom key");
    let class = Class::<Repo>::new("RepoApi");
    class.define(STAR_COUNT, |this, args| {
        let repo = repo_argument(args)?;
        Ok(this.state().source.fetch(repo))
    });
    class.cacheable(
        &[STAR_COUNT],
        options(config)?.key_format(|receiver: &Object<Repo>, method: &str, args: &[Value]| {
            Ok(CacheKey::list([
                CacheKey::from(receiver.type_name()),
                CacheKey::from(method),
                CacheKey::from(args.first().unwrap_or(&Value::Null)),
            ]))
        }),
    )?;

    let client = class.instance(Repo::new("", source));
    for name in ["rails/rails", "rust-lang/rust"] {
        let args = [json!(name)];
        println!("  key: {}", client.call("star_count_key_format", &args)?);
        report("first call", &client.call(STAR_COUNT, &args)?);
        report("second call", &client.call(STAR_COUNT, &args)?);
    }
    for name in ["rails/rails", "rust-lang/rust"] {
        client.clear_cache(STAR_COUNT, &[json!(name)])?;
    }
    Ok(())
}

fn class_method(config: &CacheConfig, source: &Arc<StarSource>) -> Result<()> {
    banner("class method");
    let class = api_class("StarCounter");
    class.cacheable(&[STAR_COUNT], options(config)?)?;

    let counter = class.singleton(Repo::new("rust-lang/rust", source));
    info!(receiver = %counter, "class-level receiver");
    report("first call", &counter.call(STAR_COUNT, &[])?);
    report("second call", &counter.call(STAR_COUNT, &[])?);
    report("uncached", &counter.call_without_cache(STAR_COUNT, &[])?);
    counter.clear_cache(STAR_COUNT, &[])?;
    Ok(())
}
