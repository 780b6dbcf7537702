use std::io;

use crate::error::Error;

/// Key/value configuration, loaded from a TOML document
///
/// Command-line tools fill it from an optional file, then override entries
/// with [`Config::set`].
pub struct Config {
    value: toml::Value,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            value: toml::Value::Table(toml::map::Map::new()),
        }
    }
}

impl Config {
    fn lookup(&self, k: &str) -> Option<&toml::Value> {
        let mut item = &self.value;
        for key in k.split('.') {
            item = item.get(key)?;
        }
        Some(item)
    }

    /// Get an entry by path. If the input argument contains dots, the path is split
    /// into keys, each key being requested recursively.
    pub fn get<T: AsRef<str>>(&self, k: T) -> Option<&str> {
        self.lookup(k.as_ref())?.as_str()
    }

    /// Get an entry of type integer by path
    pub fn get_usize<T: AsRef<str>>(&self, k: T) -> Option<usize> {
        self.lookup(k.as_ref())?
            .as_integer()
            .and_then(|i| if i >= 0 { Some(i as usize) } else { None })
    }

    /// Get an entry of type boolean by path
    pub fn get_bool<T: AsRef<str>>(&self, k: T) -> Option<bool> {
        self.lookup(k.as_ref())?.as_bool()
    }

    /// Set a top-level entry, replacing any previous value
    pub fn set<T: Into<toml::Value>>(&mut self, k: &str, v: T) -> Option<toml::Value> {
        self.value
            .as_table_mut()
            .and_then(|table| table.insert(k.to_owned(), v.into()))
    }

    /// Load configuration from input object. Previous content is replaced.
    pub fn load_config<R: io::Read>(&mut self, mut config: R) -> Result<(), Error> {
        let mut s = String::new();
        config.read_to_string(&mut s)?;
        let table = toml::from_str::<toml::Table>(&s).map_err(|e| Error::Config(e.to_string()))?;
        self.value = toml::Value::Table(table);
        Ok(())
    }
}
