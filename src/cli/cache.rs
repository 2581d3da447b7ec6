use crate::cache::{default_cache_dir, DatasetCache};
use crate::error::Result;

pub fn clear() -> Result<()> {
    let cache = DatasetCache::new(default_cache_dir());
    let removed = cache.clear()?;
    println!("Removed {removed} cached datasets from {}", cache.dir().display());
    Ok(())
}
