use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use itertools::Itertools;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    db::{Db, DbResult, Field},
    generator::{
        acknowledge::AcknowledgedU64Counter,
        constant::ConstantU64Generator,
        counter::U64Counter,
        discrete::{Choice, DiscreteGenerator},
        latest::SkewedLatestGenerator,
        random_byte::RandomByteGenerator,
        scrambled::ScrambledZipfianGenerator,
        sequential::SequentialU64Generator,
        uniform::{UniformU64Generator, UniformUsizeGenerator},
        zipfian::ZipfianGenerator,
        AcknowledgedCounter, Generator,
    },
    properties::Properties,
    utils::fnvhash64,
};

/// Internal operations of the transaction phase.
#[allow(missing_docs)]
#[derive(Debug, Clone)]
enum Op {
    Read,
    Update,
    Insert,
    Scan,
    ReadModifyWrite,
    Delete,
}

/// One experiment scenario, shared among all worker threads.
///
/// Implementations must be thread safe: `do_insert` and `do_transaction` are
/// called concurrently from every worker against that worker's own store
/// handle.
pub trait Workload: Send + Sync {
    /// Do one load-phase insert. Returns whether the store reported success.
    fn do_insert(&self, db: &mut dyn Db) -> bool;

    /// Do one run-phase transaction. Returns whether the store reported success.
    fn do_transaction(&self, db: &mut dyn Db) -> bool;
}

/// Configuration for the [`CoreWorkload`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoreWorkloadConfig {
    /// The name of the table to run queries against.
    #[serde(default = "default::table")]
    pub table: String,
    /// The number of fields in a record.
    #[serde(default = "default::field_count")]
    pub field_count: usize,
    /// Field name prefix.
    #[serde(default = "default::field_name_prefix")]
    pub field_name_prefix: String,
    /// Field value size distribution.
    ///
    /// Options are "constant", "uniform" and "zipfian". "constant" always
    /// produces `field_length` bytes, the other two draw from
    /// `[1, field_length]`.
    #[serde(default = "default::field_length_distribution")]
    pub field_length_distribution: String,
    /// Max (or constant) field value size in bytes.
    #[serde(default = "default::field_length")]
    pub field_length: u64,
    /// Deciding whether to read one field (false) or all fields (true) of a record.
    #[serde(default = "default::read_all_fields")]
    pub read_all_fields: bool,
    /// Deciding whether to write one field (false) or all fields (true) of a record.
    #[serde(default = "default::write_all_fields")]
    pub write_all_fields: bool,
    /// Proportion of transactions that are reads.
    #[serde(default = "default::read_proportion")]
    pub read_proportion: f64,
    /// Proportion of transactions that are updates.
    #[serde(default = "default::update_proportion")]
    pub update_proportion: f64,
    /// Proportion of transactions that are inserts.
    #[serde(default = "default::insert_proportion")]
    pub insert_proportion: f64,
    /// Proportion of transactions that are scans.
    #[serde(default = "default::scan_proportion")]
    pub scan_proportion: f64,
    /// Proportion of transactions that are read-modify-writes.
    #[serde(default = "default::read_modify_write_proportion")]
    pub read_modify_write_proportion: f64,
    /// Proportion of transactions that are deletes.
    #[serde(default = "default::delete_proportion")]
    pub delete_proportion: f64,
    /// The distribution of requests across the keyspace.
    ///
    /// Options are "uniform", "zipfian", "latest" and "sequential".
    #[serde(default = "default::request_distribution")]
    pub request_distribution: String,
    /// Skew of the zipfian request distribution, if overridden.
    #[serde(default)]
    pub zipfian_const: Option<f64>,
    /// Zero padding to record numbers in order to match string sort order.
    /// Controls the number of digits the decimal part is left-padded to.
    #[serde(default = "default::zero_padding")]
    pub zero_padding: usize,
    /// The min scan length (number of records).
    #[serde(default = "default::min_scan_length")]
    pub min_scan_length: u64,
    /// The max scan length (number of records).
    #[serde(default = "default::max_scan_length")]
    pub max_scan_length: u64,
    /// The scan length distribution, "uniform" or "zipfian".
    #[serde(default = "default::scan_length_distribution")]
    pub scan_length_distribution: String,
    /// The order to insert records, "ordered" or "hashed".
    #[serde(default = "default::insert_order")]
    pub insert_order: String,
    /// For parallel loads from multiple driver instances: the first record
    /// number this instance loads.
    #[serde(default = "default::insert_start")]
    pub insert_start: u64,
    /// The number of records loaded into the store by the load phase.
    #[serde(default = "default::record_count")]
    pub record_count: u64,
    /// The number of operations the run phase performs. Sizes the zipfian
    /// keyspace margin for transactional inserts.
    #[serde(default = "default::operation_count")]
    pub operation_count: u64,
    /// How many times to retry when a load-phase insert fails.
    #[serde(default = "default::insertion_retry_limit")]
    pub insertion_retry_limit: usize,
    /// On average, how long to wait between the retries, in seconds.
    #[serde(default = "default::insertion_retry_interval")]
    pub insertion_retry_interval: u64,
}

impl CoreWorkloadConfig {
    /// Build a config from driver properties, using the documented defaults
    /// for everything left unset. `recordcount` is required.
    pub fn from_properties(props: &Properties) -> Result<Self> {
        Ok(Self {
            table: props.get_or("table", &default::table()).to_string(),
            field_count: props.parse_or("fieldcount", default::field_count())?,
            field_name_prefix: props
                .get_or("fieldnameprefix", &default::field_name_prefix())
                .to_string(),
            field_length_distribution: props
                .get_or("field_len_dist", &default::field_length_distribution())
                .to_string(),
            field_length: props.parse_or("fieldlength", default::field_length())?,
            read_all_fields: props.parse_or("readallfields", default::read_all_fields())?,
            write_all_fields: props.parse_or("writeallfields", default::write_all_fields())?,
            read_proportion: props.parse_or("readproportion", default::read_proportion())?,
            update_proportion: props.parse_or("updateproportion", default::update_proportion())?,
            insert_proportion: props.parse_or("insertproportion", default::insert_proportion())?,
            scan_proportion: props.parse_or("scanproportion", default::scan_proportion())?,
            read_modify_write_proportion: props.parse_or(
                "readmodifywriteproportion",
                default::read_modify_write_proportion(),
            )?,
            delete_proportion: props.parse_or("deleteproportion", default::delete_proportion())?,
            request_distribution: props
                .get_or("requestdistribution", &default::request_distribution())
                .to_string(),
            zipfian_const: props.parse("zipfian_const")?,
            zero_padding: props.parse_or("zeropadding", default::zero_padding())?,
            min_scan_length: props.parse_or("minscanlength", default::min_scan_length())?,
            max_scan_length: props.parse_or("maxscanlength", default::max_scan_length())?,
            scan_length_distribution: props
                .get_or("scanlengthdistribution", &default::scan_length_distribution())
                .to_string(),
            insert_order: props.get_or("insertorder", &default::insert_order()).to_string(),
            insert_start: props.parse_or("insertstart", default::insert_start())?,
            record_count: props.parse_required("recordcount")?,
            operation_count: props.parse_or("operationcount", default::operation_count())?,
            insertion_retry_limit: props
                .parse_or("insertionretrylimit", default::insertion_retry_limit())?,
            insertion_retry_interval: props
                .parse_or("insertionretryinterval", default::insertion_retry_interval())?,
        })
    }
}

/// The core benchmark scenario: a set of workers doing simple CRUD
/// operations against a record store, with the relative proportion of the
/// operation kinds, the key popularity distribution and the record shape
/// controlled by [`CoreWorkloadConfig`].
///
/// The load phase draws keys from a plain shared counter; the run phase
/// draws transactional-insert keys from an acknowledged counter whose
/// watermark gates every read-side chooser, so concurrent workers never read
/// a key that has not been inserted yet.
pub struct CoreWorkload {
    table: String,
    field_names: Vec<String>,
    field_length_generator: Box<dyn Generator<Output = u64> + Send + Sync>,
    operation_chooser: DiscreteGenerator<Op>,
    key_sequencer: U64Counter,
    transaction_insert_key_sequencer: Arc<AcknowledgedU64Counter>,
    key_chooser: Box<dyn Generator<Output = u64> + Send + Sync>,
    field_chooser: UniformUsizeGenerator,
    scan_length_generator: Box<dyn Generator<Output = u64> + Send + Sync>,
    ordered_inserts: bool,
    zero_padding: usize,
    read_all_fields: bool,
    write_all_fields: bool,
    insertion_retry_limit: usize,
    insertion_retry_interval: Duration,
}

impl CoreWorkload {
    /// Create a workload from its config.
    pub fn new(config: CoreWorkloadConfig) -> Result<Self> {
        if config.record_count == 0 {
            bail!("recordcount must be at least 1");
        }
        if config.field_count == 0 {
            bail!("fieldcount must be at least 1");
        }

        let field_length_generator: Box<dyn Generator<Output = u64> + Send + Sync> =
            match config.field_length_distribution.as_str() {
                "constant" => Box::new(ConstantU64Generator::new(config.field_length)),
                "uniform" => Box::new(UniformU64Generator::new(1, config.field_length)),
                "zipfian" => Box::new(ZipfianGenerator::new(1, config.field_length)),
                other => bail!("unknown field length distribution: {other}"),
            };

        let scan_length_generator: Box<dyn Generator<Output = u64> + Send + Sync> =
            match config.scan_length_distribution.as_str() {
                "uniform" => Box::new(UniformU64Generator::new(
                    config.min_scan_length,
                    config.max_scan_length,
                )),
                "zipfian" => Box::new(ZipfianGenerator::new(
                    config.min_scan_length,
                    config.max_scan_length,
                )),
                other => bail!("unknown scan length distribution: {other}"),
            };

        let mut choices = vec![];
        if config.read_proportion > 0.0 {
            choices.push(Choice {
                val: Op::Read,
                weight: config.read_proportion,
            });
        }
        if config.update_proportion > 0.0 {
            choices.push(Choice {
                val: Op::Update,
                weight: config.update_proportion,
            });
        }
        if config.insert_proportion > 0.0 {
            choices.push(Choice {
                val: Op::Insert,
                weight: config.insert_proportion,
            });
        }
        if config.scan_proportion > 0.0 {
            choices.push(Choice {
                val: Op::Scan,
                weight: config.scan_proportion,
            });
        }
        if config.read_modify_write_proportion > 0.0 {
            choices.push(Choice {
                val: Op::ReadModifyWrite,
                weight: config.read_modify_write_proportion,
            });
        }
        if config.delete_proportion > 0.0 {
            choices.push(Choice {
                val: Op::Delete,
                weight: config.delete_proportion,
            });
        }
        if choices.is_empty() {
            bail!("at least one operation proportion must be positive");
        }
        let operation_chooser = DiscreteGenerator::new(choices);

        let key_sequencer = U64Counter::new(config.insert_start);
        let transaction_insert_key_sequencer =
            Arc::new(AcknowledgedU64Counter::new(config.record_count));

        let key_chooser: Box<dyn Generator<Output = u64> + Send + Sync> =
            match config.request_distribution.as_str() {
                "uniform" => Box::new(UniformU64Generator::new(0, config.record_count - 1)),
                "zipfian" => {
                    // Run-phase inserts grow the keyspace, and we do not want
                    // growth to remap the popular keys. Cover the keyspace the
                    // run can at most reach, with a 2x margin; samples beyond
                    // the watermark are simply discarded and redrawn.
                    let new_keys =
                        (config.operation_count as f64 * config.insert_proportion * 2.0) as u64;
                    match config.zipfian_const {
                        Some(theta) => Box::new(ScrambledZipfianGenerator::with_theta(
                            0,
                            config.record_count + new_keys - 1,
                            theta,
                        )),
                        None => Box::new(ScrambledZipfianGenerator::from_items(
                            config.record_count + new_keys,
                        )),
                    }
                }
                "latest" => Box::new(SkewedLatestGenerator::new(
                    transaction_insert_key_sequencer.clone(),
                )),
                "sequential" => {
                    Box::new(SequentialU64Generator::new(0, config.record_count - 1))
                }
                other => bail!("unknown request distribution: {other}"),
            };

        let field_names = (0..config.field_count)
            .map(|i| format!("{prefix}{i}", prefix = config.field_name_prefix))
            .collect_vec();
        let field_chooser = UniformUsizeGenerator::new(0, field_names.len() - 1);

        Ok(Self {
            table: config.table,
            field_names,
            field_length_generator,
            operation_chooser,
            key_sequencer,
            transaction_insert_key_sequencer,
            key_chooser,
            field_chooser,
            scan_length_generator,
            ordered_inserts: config.insert_order.as_str() != "hashed",
            zero_padding: config.zero_padding,
            read_all_fields: config.read_all_fields,
            write_all_fields: config.write_all_fields,
            insertion_retry_limit: config.insertion_retry_limit,
            insertion_retry_interval: Duration::from_secs(config.insertion_retry_interval),
        })
    }

    /// Watermark of acknowledged transactional inserts.
    pub fn transaction_insert_last(&self) -> u64 {
        self.transaction_insert_key_sequencer.last()
    }

    fn build_key_name(&self, mut key_num: u64) -> String {
        if !self.ordered_inserts {
            key_num = fnvhash64(key_num);
        }
        format!("user{key_num:0width$}", width = self.zero_padding)
    }

    fn next_field_name(&self) -> String {
        self.field_names[self.field_chooser.next()].clone()
    }

    fn build_values(&self) -> Vec<Field> {
        self.field_names
            .iter()
            .map(|name| {
                let len = self.field_length_generator.next() as usize;
                Field {
                    name: name.clone(),
                    value: RandomByteGenerator::new().fill(len),
                }
            })
            .collect()
    }

    fn build_single_value(&self) -> Vec<Field> {
        let len = self.field_length_generator.next() as usize;
        vec![Field {
            name: self.next_field_name(),
            value: RandomByteGenerator::new().fill(len),
        }]
    }

    /// Draw a key number for a read-side transaction, discarding samples
    /// beyond the acknowledged-insert watermark. Terminates with probability
    /// 1 because the chooser's range was sized with a margin.
    fn next_transaction_key_num(&self) -> u64 {
        loop {
            let key_num = self.key_chooser.next();
            if key_num <= self.transaction_insert_key_sequencer.last() {
                return key_num;
            }
        }
    }

    fn read_fields(&self) -> Option<Vec<String>> {
        if self.read_all_fields {
            None
        } else {
            Some(vec![self.next_field_name()])
        }
    }

    fn write_values(&self) -> Vec<Field> {
        if self.write_all_fields {
            self.build_values()
        } else {
            self.build_single_value()
        }
    }

    fn transaction_read(&self, db: &mut dyn Db) -> DbResult<()> {
        let key = self.build_key_name(self.next_transaction_key_num());
        let fields = self.read_fields();
        db.read(&self.table, &key, fields.as_deref())?;
        Ok(())
    }

    fn transaction_scan(&self, db: &mut dyn Db) -> DbResult<()> {
        let key = self.build_key_name(self.next_transaction_key_num());
        let len = self.scan_length_generator.next() as usize;
        let fields = self.read_fields();
        db.scan(&self.table, &key, len, fields.as_deref())?;
        Ok(())
    }

    fn transaction_update(&self, db: &mut dyn Db) -> DbResult<()> {
        let key = self.build_key_name(self.next_transaction_key_num());
        db.update(&self.table, &key, self.write_values())
    }

    fn transaction_read_modify_write(&self, db: &mut dyn Db) -> DbResult<()> {
        let key = self.build_key_name(self.next_transaction_key_num());
        let fields = self.read_fields();
        // The read result does not matter, only the update outcome does.
        let _ = db.read(&self.table, &key, fields.as_deref());
        db.update(&self.table, &key, self.write_values())
    }

    fn transaction_insert(&self, db: &mut dyn Db) -> DbResult<()> {
        let key_num = self.transaction_insert_key_sequencer.next();
        let key = self.build_key_name(key_num);
        let result = db.insert(&self.table, &key, self.build_values());
        // Acknowledged even on failure: leaving a hole would freeze the
        // watermark for the rest of the run. The failure stays visible as an
        // INSERT-FAILED measurement.
        self.transaction_insert_key_sequencer.acknowledge(key_num);
        result
    }

    fn transaction_delete(&self, db: &mut dyn Db) -> DbResult<()> {
        let key = self.build_key_name(self.next_transaction_key_num());
        db.delete(&self.table, &key)
    }
}

impl Workload for CoreWorkload {
    fn do_insert(&self, db: &mut dyn Db) -> bool {
        let key = self.build_key_name(self.key_sequencer.next());
        let values = self.build_values();

        let mut attempt = 0;
        loop {
            match db.insert(&self.table, &key, values.clone()) {
                Ok(()) => return true,
                Err(e) if attempt < self.insertion_retry_limit => {
                    attempt += 1;
                    tracing::warn!(
                        "insert of {key} failed, retry {attempt}/{}: {e}",
                        self.insertion_retry_limit
                    );
                    let jitter = thread_rng().gen_range(0.8..=1.2);
                    std::thread::sleep(self.insertion_retry_interval.mul_f64(jitter));
                }
                Err(e) => {
                    tracing::warn!("insert of {key} failed permanently: {e}");
                    return false;
                }
            }
        }
    }

    fn do_transaction(&self, db: &mut dyn Db) -> bool {
        let result = match self.operation_chooser.next() {
            Op::Read => self.transaction_read(db),
            Op::Update => self.transaction_update(db),
            Op::Insert => self.transaction_insert(db),
            Op::Scan => self.transaction_scan(db),
            Op::ReadModifyWrite => self.transaction_read_modify_write(db),
            Op::Delete => self.transaction_delete(db),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("transaction failed: {e}");
                false
            }
        }
    }
}

/// Constructor for one registered workload.
pub type WorkloadConstructor =
    Box<dyn Fn(&Properties) -> Result<Arc<dyn Workload>> + Send + Sync>;

/// Explicit name-to-workload registry, mirroring the store registry.
#[derive(Default)]
pub struct WorkloadFactory {
    constructors: BTreeMap<String, WorkloadConstructor>,
}

impl WorkloadFactory {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workload under `name`, replacing any previous registration.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        constructor: impl Fn(&Properties) -> Result<Arc<dyn Workload>> + Send + Sync + 'static,
    ) {
        self.constructors.insert(name.into(), Box::new(constructor));
    }

    /// Create the workload registered under `name`.
    pub fn create(&self, name: &str, props: &Properties) -> Result<Arc<dyn Workload>> {
        match self.constructors.get(name) {
            Some(constructor) => constructor(props),
            None => bail!(
                "unknown workload {name:?}; registered: {:?}",
                self.constructors.keys().collect::<Vec<_>>()
            ),
        }
    }
}

/// Register the built-in workloads; `core` is the only one.
pub fn register_builtin(factory: &mut WorkloadFactory) {
    factory.register("core", |props| {
        let config = CoreWorkloadConfig::from_properties(props)?;
        Ok(Arc::new(CoreWorkload::new(config)?) as Arc<dyn Workload>)
    });
}

/// Default values for configurations.
#[allow(missing_docs)]
pub mod default {
    pub fn table() -> String {
        "usertable".to_string()
    }

    pub fn field_count() -> usize {
        10
    }

    pub fn field_name_prefix() -> String {
        "field".to_string()
    }

    pub fn field_length_distribution() -> String {
        "constant".to_string()
    }

    pub fn field_length() -> u64 {
        100
    }

    pub fn read_all_fields() -> bool {
        true
    }

    pub fn write_all_fields() -> bool {
        false
    }

    pub fn read_proportion() -> f64 {
        0.95
    }

    pub fn update_proportion() -> f64 {
        0.05
    }

    pub fn insert_proportion() -> f64 {
        0.0
    }

    pub fn scan_proportion() -> f64 {
        0.0
    }

    pub fn read_modify_write_proportion() -> f64 {
        0.0
    }

    pub fn delete_proportion() -> f64 {
        0.0
    }

    pub fn request_distribution() -> String {
        "uniform".to_string()
    }

    pub fn zero_padding() -> usize {
        1
    }

    pub fn min_scan_length() -> u64 {
        1
    }

    pub fn max_scan_length() -> u64 {
        1000
    }

    pub fn scan_length_distribution() -> String {
        "uniform".to_string()
    }

    pub fn insert_order() -> String {
        "hashed".to_string()
    }

    pub fn insert_start() -> u64 {
        0
    }

    pub fn record_count() -> u64 {
        0
    }

    pub fn operation_count() -> u64 {
        0
    }

    pub fn insertion_retry_limit() -> usize {
        0
    }

    pub fn insertion_retry_interval() -> u64 {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db::memory::MemoryDb;
    use crate::db::DbError;

    fn config(record_count: u64) -> CoreWorkloadConfig {
        let mut props = Properties::new();
        props.set("recordcount", record_count.to_string());
        CoreWorkloadConfig::from_properties(&props).unwrap()
    }

    #[test]
    fn config_defaults_deserialize_from_empty_json() {
        let config: CoreWorkloadConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.table, "usertable");
        assert_eq!(config.field_count, 10);
        assert_eq!(config.field_length, 100);
        assert!(config.read_all_fields);
        assert!(!config.write_all_fields);
        assert_eq!(config.read_proportion, 0.95);
        assert_eq!(config.request_distribution, "uniform");
        assert_eq!(config.insert_order, "hashed");
        assert_eq!(config.zipfian_const, None);
    }

    #[test]
    fn properties_override_defaults() {
        let mut props = Properties::new();
        props.load_str("recordcount=100\nfieldcount = 3\ninsertorder=ordered\nzipfian_const=0.8");
        let config = CoreWorkloadConfig::from_properties(&props).unwrap();
        assert_eq!(config.record_count, 100);
        assert_eq!(config.field_count, 3);
        assert_eq!(config.insert_order, "ordered");
        assert_eq!(config.zipfian_const, Some(0.8));
    }

    #[test]
    fn record_count_is_required() {
        assert!(CoreWorkloadConfig::from_properties(&Properties::new()).is_err());
    }

    #[test]
    fn ordered_key_names_round_trip() {
        let mut c = config(1000);
        c.insert_order = "ordered".to_string();
        let wl = CoreWorkload::new(c.clone()).unwrap();
        assert_eq!(wl.build_key_name(0), "user0");
        assert_eq!(wl.build_key_name(37), "user37");

        c.zero_padding = 20;
        let wl = CoreWorkload::new(c).unwrap();
        assert_eq!(wl.build_key_name(5), "user00000000000000000005");
        assert_eq!(wl.build_key_name(5).len(), 4 + 20);
    }

    #[test]
    fn hashed_key_names_mix_through_fnv() {
        let c = config(1000);
        let wl = CoreWorkload::new(c).unwrap();
        assert_eq!(wl.build_key_name(7), format!("user{}", fnvhash64(7)));
        // FNV-1a-64 of the little-endian bytes of 7, as the upstream
        // FNVHash64 computes it.
        assert_eq!(wl.build_key_name(7), format!("user{}", 0x4BD7A317074C5B62u64));
    }

    #[test]
    fn values_cover_every_field_with_printable_bytes() {
        let wl = CoreWorkload::new(config(10)).unwrap();
        let values = wl.build_values();
        assert_eq!(values.len(), 10);
        for (i, field) in values.iter().enumerate() {
            assert_eq!(field.name, format!("field{i}"));
            assert_eq!(field.value.len(), 100);
            assert!(field.value.iter().all(|b| (b' '..=127).contains(b)));
        }

        let single = wl.build_single_value();
        assert_eq!(single.len(), 1);
        assert!(wl.field_names.contains(&single[0].name));
    }

    #[test]
    fn transaction_keys_never_pass_the_watermark() {
        let mut c = config(100);
        c.request_distribution = "zipfian".to_string();
        c.operation_count = 1000;
        c.insert_proportion = 0.5;
        let wl = CoreWorkload::new(c).unwrap();

        for _ in 0..10_000 {
            assert!(wl.next_transaction_key_num() <= wl.transaction_insert_last());
        }
    }

    #[test]
    fn failed_transaction_insert_still_acknowledges() {
        struct FailingDb;
        impl Db for FailingDb {
            fn read(&mut self, _: &str, _: &str, _: Option<&[String]>) -> DbResult<Vec<Field>> {
                Err(DbError::NotImplemented)
            }
            fn scan(
                &mut self,
                _: &str,
                _: &str,
                _: usize,
                _: Option<&[String]>,
            ) -> DbResult<Vec<Vec<Field>>> {
                Err(DbError::NotImplemented)
            }
            fn update(&mut self, _: &str, _: &str, _: Vec<Field>) -> DbResult<()> {
                Err(DbError::NotImplemented)
            }
            fn insert(&mut self, _: &str, _: &str, _: Vec<Field>) -> DbResult<()> {
                Err(DbError::NotImplemented)
            }
            fn delete(&mut self, _: &str, _: &str) -> DbResult<()> {
                Err(DbError::NotImplemented)
            }
        }

        let wl = CoreWorkload::new(config(50)).unwrap();
        let mut db = FailingDb;
        assert_eq!(wl.transaction_insert_last(), 49);
        assert!(wl.transaction_insert(&mut db).is_err());
        assert_eq!(wl.transaction_insert_last(), 50, "watermark must not wedge");
    }

    #[test]
    fn do_insert_loads_distinct_keys() {
        let wl = CoreWorkload::new(config(100)).unwrap();
        let mut db = MemoryDb::new();
        for _ in 0..100 {
            assert!(wl.do_insert(&mut db));
        }
        assert_eq!(db.len("usertable"), 100, "hashed keys must not collide");
    }

    #[test]
    fn unknown_distributions_are_config_errors() {
        let mut c = config(10);
        c.request_distribution = "pareto".to_string();
        assert!(CoreWorkload::new(c).is_err());

        let mut c = config(10);
        c.field_length_distribution = "histogram".to_string();
        assert!(CoreWorkload::new(c).is_err());

        let mut c = config(10);
        c.scan_length_distribution = "exponential".to_string();
        assert!(CoreWorkload::new(c).is_err());
    }

    #[test]
    fn all_zero_proportions_are_rejected() {
        let mut c = config(10);
        c.read_proportion = 0.0;
        c.update_proportion = 0.0;
        assert!(CoreWorkload::new(c).is_err());
    }

    #[test]
    fn factory_builds_the_core_workload() {
        let mut factory = WorkloadFactory::new();
        register_builtin(&mut factory);

        let mut props = Properties::new();
        props.set("recordcount", "10");
        assert!(factory.create("core", &props).is_ok());
        assert!(factory.create("exotic", &props).is_err());
    }
}
