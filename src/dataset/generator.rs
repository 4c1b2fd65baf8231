//! Deterministic synthetic dataset generation.
//!
//! One ChaCha8 stream seeded from the generation parameters drives every
//! draw, so identical (seed, contract count) pairs produce byte-identical
//! tables. Free-text fields (names, companies, descriptions) are composed
//! from fixed word lists in the style of the fake crate.

use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::dataset::schema::{self, DatasetSchema, TableSchema};
use crate::dataset::{
    vendors_to_table, Dataset, GenerationParams, PastPerformance, PointOfContact, Table,
    VendorRecord,
};
use crate::error::GenerationError;

// ============================================================================
// Vocabularies
// ============================================================================

/// Contract type vocabulary; feature encoding uses the index order.
pub const CONTRACT_TYPES: [&str; 6] = [
    "Firm-Fixed-Price",
    "Cost-Plus-Fixed-Fee",
    "Time-and-Materials",
    "Indefinite-Delivery",
    "Cost-Plus-Incentive-Fee",
    "Cost-Plus-Award-Fee",
];

/// Contract status vocabulary; feature encoding uses the index order.
pub const CONTRACT_STATUS: [&str; 5] =
    ["Active", "Completed", "Terminated", "On Hold", "In Negotiation"];

/// Owning department vocabulary; feature encoding uses the index order.
pub const DEPARTMENTS: [&str; 9] = [
    "Navy",
    "Army",
    "Air Force",
    "Marines",
    "Coast Guard",
    "DLA",
    "DARPA",
    "NSA",
    "DIA",
];

const PROJECT_TYPES: [&str; 10] = [
    "Research",
    "Development",
    "Testing",
    "Production",
    "Maintenance",
    "IT Services",
    "Consulting",
    "Training",
    "Construction",
    "Logistics",
];

const TRANSACTION_TYPES: [&str; 6] = ["Labor", "Material", "Travel", "Subcontract", "ODC", "Fee"];

const PERSONNEL_ROLES: [&str; 8] = [
    "Project Manager",
    "Financial Analyst",
    "Contract Specialist",
    "Program Manager",
    "Technical Lead",
    "Engineer",
    "Quality Assurance",
    "Subject Matter Expert",
];

const MODIFICATION_TYPES: [&str; 6] = [
    "Administrative",
    "Funding",
    "Schedule",
    "Scope Change",
    "Extension",
    "Termination",
];

const DELIVERABLE_TYPES: [&str; 7] = [
    "Report",
    "Software",
    "Hardware",
    "Documentation",
    "Prototype",
    "Training",
    "Data",
];

const DELIVERABLE_STATUS: [&str; 5] = ["Pending", "Delivered", "Accepted", "Rejected", "Delayed"];

const MODIFICATION_STATUS: [&str; 4] = ["Approved", "Pending", "Rejected", "In Review"];

const VENDOR_SIZES: [&str; 4] = ["Small", "Medium", "Large", "Very Large"];

const PROCUREMENT_CATEGORIES: [&str; 13] = [
    "IT Services",
    "Hardware",
    "Software",
    "Engineering",
    "R&D",
    "Professional Services",
    "Manufacturing",
    "Logistics",
    "Consulting",
    "Training",
    "Facilities",
    "Security",
    "Telecommunications",
];

const SOCIOECONOMIC_DESIGNATIONS: [&str; 6] = ["8(a)", "SDVOSB", "WOSB", "HUBZone", "SB", "LB"];

const SECURITY_CLEARANCES: [&str; 5] =
    ["Secret", "Top Secret", "TS/SCI", "Confidential", "Public Trust"];

const PROJECT_PRIORITIES: [&str; 4] = ["Low", "Medium", "High", "Critical"];

/// Modification types that change the contract value.
const VALUE_CHANGING_MODS: [&str; 3] = ["Funding", "Scope Change", "Extension"];

/// Modification types that change the contract schedule.
const SCHEDULE_CHANGING_MODS: [&str; 2] = ["Schedule", "Extension"];

// ============================================================================
// Generator
// ============================================================================

/// Per-contract facts kept in memory for the dependent tables, so
/// transactions, modifications, and deliverables can land inside their
/// contract's window without re-reading the contracts table.
struct ContractSeed {
    id: String,
    start: NaiveDate,
    end: NaiveDate,
    current_value: f64,
}

/// Deterministic generator for the contract-financial dataset.
///
/// The generator is pure with respect to its parameters: it produces the
/// in-memory `Dataset` and never touches the filesystem. Persisting the
/// result is the caller's concern.
pub struct DatasetGenerator {
    schema: DatasetSchema,
}

impl DatasetGenerator {
    /// Creates a generator for the given schema.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::MalformedSchema` when the schema fails
    /// validation or does not declare the stock table shapes the generator
    /// knows how to fill.
    pub fn new(schema: DatasetSchema) -> Result<Self, GenerationError> {
        schema.validate()?;
        check_stock_shape(&schema)?;
        Ok(Self { schema })
    }

    /// Creates a generator over the stock schema.
    pub fn with_default_schema() -> Self {
        Self {
            schema: schema::default_schema(),
        }
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Generates the full dataset for the given parameters.
    ///
    /// Table order matches the single RNG stream: contracts, vendors,
    /// projects, transactions, modifications, deliverables, personnel.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidSize` when the contract count is zero.
    pub fn generate(&self, params: &GenerationParams) -> Result<Dataset, GenerationError> {
        params.validate()?;

        let mut ctx = GenerationContext::new(*params);
        let tables = vec![
            ctx.generate_contracts(self.table(schema::TABLE_CONTRACTS)),
            ctx.generate_vendors(self.table(schema::TABLE_VENDORS)),
            ctx.generate_projects(self.table(schema::TABLE_PROJECTS)),
            ctx.generate_transactions(self.table(schema::TABLE_TRANSACTIONS)),
            ctx.generate_modifications(self.table(schema::TABLE_MODIFICATIONS)),
            ctx.generate_deliverables(self.table(schema::TABLE_DELIVERABLES)),
            ctx.generate_personnel(self.table(schema::TABLE_PERSONNEL)),
        ];

        tracing::info!(
            seed = params.seed,
            contracts = params.contract_count,
            total_rows = tables.iter().map(|t| t.rows.len()).sum::<usize>(),
            "Generated dataset"
        );

        Ok(Dataset::new(*params, tables))
    }

    /// Table schema lookup; presence is guaranteed by the constructor check.
    fn table(&self, name: &str) -> &TableSchema {
        self.schema
            .table(name)
            .unwrap_or_else(|| panic!("schema checked at construction declares '{}'", name))
    }
}

/// Verifies the schema declares exactly the stock tables and columns.
fn check_stock_shape(schema: &DatasetSchema) -> Result<(), GenerationError> {
    let stock = schema::default_schema();
    for stock_table in &stock.tables {
        let table = schema.table(&stock_table.name).ok_or_else(|| {
            GenerationError::MalformedSchema(format!(
                "schema is missing table '{}'",
                stock_table.name
            ))
        })?;
        if table.column_names() != stock_table.column_names() {
            return Err(GenerationError::MalformedSchema(format!(
                "table '{}' does not declare the stock columns",
                stock_table.name
            )));
        }
    }
    for table in &schema.tables {
        if stock.table(&table.name).is_none() {
            return Err(GenerationError::MalformedSchema(format!(
                "schema declares unknown table '{}'",
                table.name
            )));
        }
    }
    Ok(())
}

struct GenerationContext {
    params: GenerationParams,
    rng: ChaCha8Rng,
    vendor_ids: Vec<String>,
    project_ids: Vec<String>,
    personnel_ids: Vec<String>,
    contracts: Vec<ContractSeed>,
}

impl GenerationContext {
    fn new(params: GenerationParams) -> Self {
        Self {
            params,
            rng: ChaCha8Rng::seed_from_u64(params.seed),
            vendor_ids: (1..=params.vendor_count())
                .map(|i| format!("VEN-{:04}", i))
                .collect(),
            project_ids: (1..=params.project_count())
                .map(|i| format!("PRJ-{:04}", i))
                .collect(),
            personnel_ids: (1..=params.personnel_count())
                .map(|i| format!("PER-{:05}", i))
                .collect(),
            contracts: Vec::new(),
        }
    }

    fn generate_contracts(&mut self, table_schema: &TableSchema) -> Table {
        let mut table = Table::new(table_schema.name.clone(), table_schema.column_names());
        let start_years = [2018, 2019, 2020, 2021, 2022, 2023, 2024];
        let year_weights = [1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 15.0];
        let duration_weights = [40.0, 30.0, 15.0, 10.0, 5.0];
        let value_modifiers = [0.8, 0.9, 1.0, 1.1, 1.2, 1.5];
        let modifier_weights = [5.0, 15.0, 50.0, 20.0, 8.0, 2.0];
        let status_weights = [60.0, 25.0, 5.0, 5.0, 5.0];

        for i in 1..=self.params.contract_count {
            let contract_id = format!("CTR-{:06}", i);
            let contract_number = format!(
                "N00{}-{}-D-{}",
                self.rng.random_range(10000..=99999),
                self.rng.random_range(10..=99),
                self.rng.random_range(1000..=9999)
            );
            let vendor_id = pick(&mut self.rng, &self.vendor_ids).clone();
            let project_id = pick(&mut self.rng, &self.project_ids).clone();
            let contract_type = *pick(&mut self.rng, &CONTRACT_TYPES);

            // Start year weighted toward recent, start day uniform in year.
            let start_year = start_years[weighted_index(&mut self.rng, &year_weights)];
            let start_date = date_in_year(&mut self.rng, start_year);
            let duration_years = 1 + weighted_index(&mut self.rng, &duration_weights) as i64;
            let end_date = start_date + Duration::days(365 * duration_years);

            let original_value = round2(self.rng.random_range(100_000.0..50_000_000.0));
            let modifier = value_modifiers[weighted_index(&mut self.rng, &modifier_weights)];
            let current_value = round2(original_value * modifier);

            let status = CONTRACT_STATUS[weighted_index(&mut self.rng, &status_weights)];
            let department = *pick(&mut self.rng, &DEPARTMENTS);
            let description = business_phrase(&mut self.rng);
            let contracting_officer = pick(&mut self.rng, &self.personnel_ids).clone();

            table.push_row(vec![
                contract_id.clone(),
                contract_number,
                vendor_id,
                project_id,
                contract_type.to_string(),
                format_date(start_date),
                format_date(end_date),
                format!("{:.2}", original_value),
                format!("{:.2}", current_value),
                status.to_string(),
                department.to_string(),
                description,
                contracting_officer,
            ]);

            self.contracts.push(ContractSeed {
                id: contract_id,
                start: start_date,
                end: end_date,
                current_value,
            });
        }
        table
    }

    fn generate_vendors(&mut self, table_schema: &TableSchema) -> Table {
        let mut records = Vec::with_capacity(self.vendor_ids.len());
        for i in 0..self.vendor_ids.len() {
            let vendor_id = self.vendor_ids[i].clone();
            let name = company_name(&mut self.rng);
            let slug = slugify(&name);
            let category_count = self.rng.random_range(1..=5);
            let socioeconomic_count = self.rng.random_range(0..=3);
            let city = *pick(&mut self.rng, &CITIES);
            let state = *pick(&mut self.rng, &STATE_ABBRS);
            let zip_code = format!("{:05}", self.rng.random_range(10000..100000));
            let street = street_address(&mut self.rng);

            records.push(VendorRecord {
                vendor_id,
                name,
                duns_number: self.rng.random_range(100_000_000..=999_999_999u64).to_string(),
                cage_code: self.rng.random_range(10000..=99999u32).to_string(),
                address: format!("{}, {}, {} {}", street, city, state, zip_code),
                city: city.to_string(),
                state: state.to_string(),
                zip_code,
                phone: phone_number(&mut self.rng),
                email: format!("info@{}.com", slug),
                website: format!("https://www.{}.com", slug),
                size: pick(&mut self.rng, &VENDOR_SIZES).to_string(),
                categories: sample_distinct(&mut self.rng, &PROCUREMENT_CATEGORIES, category_count),
                socioeconomic: sample_distinct(
                    &mut self.rng,
                    &SOCIOECONOMIC_DESIGNATIONS,
                    socioeconomic_count,
                ),
                annual_revenue: round2(self.rng.random_range(1_000_000.0..5_000_000_000.0)),
                year_established: self.rng.random_range(1950..=2020),
                past_performance: PastPerformance {
                    on_time_delivery_rate: round2(self.rng.random_range(0.7..1.0)),
                    quality_rating: round1(self.rng.random_range(3.0..5.0)),
                    cost_variance: round2(self.rng.random_range(-0.2..0.3)),
                    contracts_completed: self.rng.random_range(5..=200),
                    avg_contract_value: round2(self.rng.random_range(100_000.0..10_000_000.0)),
                },
                active_contracts: self.rng.random_range(1..=30),
                point_of_contact: {
                    let (first, last) = person_name_parts(&mut self.rng);
                    PointOfContact {
                        name: format!("{} {}", first, last),
                        title: pick(&mut self.rng, &JOB_TITLES).to_string(),
                        phone: phone_number(&mut self.rng),
                        email: format!(
                            "{}.{}@{}.com",
                            first.to_lowercase(),
                            last.to_lowercase(),
                            slug
                        ),
                    }
                },
            });
        }
        vendors_to_table(&records, table_schema)
    }

    fn generate_projects(&mut self, table_schema: &TableSchema) -> Table {
        let mut table = Table::new(table_schema.name.clone(), table_schema.column_names());
        for i in 0..self.project_ids.len() {
            let project_id = self.project_ids[i].clone();
            let name = format!("Project {}", catch_phrase(&mut self.rng));
            let project_type = *pick(&mut self.rng, &PROJECT_TYPES);
            let description = paragraph(&mut self.rng, 3);

            // Programs run longer than the contracts they fund, 2 to 7 years.
            let start_year = self.rng.random_range(2015..=2022);
            let start_date = date_in_year(&mut self.rng, start_year);
            let duration_years = self.rng.random_range(2..=7i64);
            let end_date = start_date + Duration::days(365 * duration_years);

            let total_budget = round2(self.rng.random_range(5_000_000.0..500_000_000.0));
            let department = *pick(&mut self.rng, &DEPARTMENTS);
            let program_manager = pick(&mut self.rng, &self.personnel_ids).clone();
            let priority = *pick(&mut self.rng, &PROJECT_PRIORITIES);

            table.push_row(vec![
                project_id,
                name,
                project_type.to_string(),
                description,
                format_date(start_date),
                format_date(end_date),
                format!("{:.2}", total_budget),
                department.to_string(),
                program_manager,
                priority.to_string(),
            ]);
        }
        table
    }

    fn generate_transactions(&mut self, table_schema: &TableSchema) -> Table {
        let mut table = Table::new(table_schema.name.clone(), table_schema.column_names());
        for _ in 0..self.params.transaction_count() {
            // Version-4 UUID built from the seeded stream, so ids reproduce.
            let transaction_id = uuid::Builder::from_random_bytes(self.rng.random()).into_uuid();
            let contract = &self.contracts[self.rng.random_range(0..self.contracts.len())];
            let contract_id = contract.id.clone();
            let (start, end, current_value) = (contract.start, contract.end, contract.current_value);

            let transaction_date = date_between(&mut self.rng, start, end);
            // One transaction never exceeds 10% of the contract value.
            let max_amount = current_value * 0.1;
            let amount = round2(self.rng.random_range(1000.0..max_amount));
            let transaction_type = *pick(&mut self.rng, &TRANSACTION_TYPES);
            let description = sentence(&mut self.rng);
            let (fiscal_year, fiscal_quarter) = fiscal_calendar(transaction_date);
            let invoice_number = format!("INV-{}", self.rng.random_range(10000..=99999));
            let approved_by = pick(&mut self.rng, &self.personnel_ids).clone();

            table.push_row(vec![
                transaction_id.to_string(),
                contract_id,
                format_date(transaction_date),
                format!("{:.2}", amount),
                transaction_type.to_string(),
                description,
                fiscal_year.to_string(),
                format!("Q{}", fiscal_quarter),
                invoice_number,
                approved_by,
            ]);
        }
        table
    }

    fn generate_modifications(&mut self, table_schema: &TableSchema) -> Table {
        let mut table = Table::new(table_schema.name.clone(), table_schema.column_names());
        for i in 1..=self.params.modification_count() {
            let modification_id = format!("MOD-{:06}", i);
            let contract = &self.contracts[self.rng.random_range(0..self.contracts.len())];
            let contract_id = contract.id.clone();
            let (start, end, current_value) = (contract.start, contract.end, contract.current_value);

            let mod_number = format!(
                "P{}{}",
                self.rng.random_range(0..=9),
                self.rng.random_range(10..=99)
            );
            let mod_date = date_between(&mut self.rng, start, end);
            let mod_type = *pick(&mut self.rng, &MODIFICATION_TYPES);
            let description = sentence(&mut self.rng);

            let value_change = if VALUE_CHANGING_MODS.contains(&mod_type) {
                round2(
                    self.rng
                        .random_range(-0.2 * current_value..0.3 * current_value),
                )
            } else {
                0.0
            };
            let days_change = if SCHEDULE_CHANGING_MODS.contains(&mod_type) {
                self.rng.random_range(-30..=180)
            } else {
                0
            };

            let approved_by = pick(&mut self.rng, &self.personnel_ids).clone();
            let status = *pick(&mut self.rng, &MODIFICATION_STATUS);

            table.push_row(vec![
                modification_id,
                contract_id,
                mod_number,
                format_date(mod_date),
                mod_type.to_string(),
                description,
                format!("{:.2}", value_change),
                days_change.to_string(),
                approved_by,
                status.to_string(),
            ]);
        }
        table
    }

    fn generate_deliverables(&mut self, table_schema: &TableSchema) -> Table {
        let mut table = Table::new(table_schema.name.clone(), table_schema.column_names());
        let offset_days = [-10, -5, 0, 3, 7, 15, 30];
        let offset_weights = [5.0, 10.0, 60.0, 10.0, 8.0, 5.0, 2.0];
        let accepted_weights = [80.0, 15.0, 5.0];
        let accepted_values = ["Yes", "No", "Conditional"];

        for i in 1..=self.params.deliverable_count() {
            let deliverable_id = format!("DEL-{:06}", i);
            let contract = &self.contracts[self.rng.random_range(0..self.contracts.len())];
            let contract_id = contract.id.clone();
            let (start, end) = (contract.start, contract.end);

            let due_date = date_between(&mut self.rng, start, end);
            let title = format!("Deliverable {}", business_phrase(&mut self.rng));
            let deliverable_type = *pick(&mut self.rng, &DELIVERABLE_TYPES);
            let description = paragraph(&mut self.rng, 2);
            let status = *pick(&mut self.rng, &DELIVERABLE_STATUS);

            // Delivery only exists once something was actually handed over.
            let (delivery_date, accepted) =
                if matches!(status, "Delivered" | "Accepted" | "Rejected") {
                    let offset = offset_days[weighted_index(&mut self.rng, &offset_weights)];
                    let delivery = due_date + Duration::days(offset);
                    let accepted = if status == "Delivered" {
                        accepted_values[weighted_index(&mut self.rng, &accepted_weights)]
                    } else {
                        "N/A"
                    };
                    (format_date(delivery), accepted)
                } else {
                    (String::new(), "N/A")
                };

            let reviewer = pick(&mut self.rng, &self.personnel_ids).clone();

            table.push_row(vec![
                deliverable_id,
                contract_id,
                title,
                deliverable_type.to_string(),
                format_date(due_date),
                delivery_date,
                status.to_string(),
                description,
                accepted.to_string(),
                reviewer,
            ]);
        }
        table
    }

    fn generate_personnel(&mut self, table_schema: &TableSchema) -> Table {
        let mut table = Table::new(table_schema.name.clone(), table_schema.column_names());
        // Fixed hire window keeps output independent of the wall clock.
        let hire_start = date_constant(2004, 1, 1);
        let hire_end = date_constant(2024, 12, 31);

        for i in 0..self.personnel_ids.len() {
            let personnel_id = self.personnel_ids[i].clone();
            let (first, last) = person_name_parts(&mut self.rng);
            let role = *pick(&mut self.rng, &PERSONNEL_ROLES);
            let department = *pick(&mut self.rng, &DEPARTMENTS);
            let email = format!("{}.{}@example.mil", first.to_lowercase(), last.to_lowercase());
            let phone = phone_number(&mut self.rng);
            let clearance = *pick(&mut self.rng, &SECURITY_CLEARANCES);
            let hire_date = date_between(&mut self.rng, hire_start, hire_end);

            let supervisor = if self.rng.random::<f64>() < 0.8 {
                // Draw until the supervisor is someone else; the id list is
                // always at least 8 long.
                loop {
                    let candidate =
                        &self.personnel_ids[self.rng.random_range(0..self.personnel_ids.len())];
                    if *candidate != personnel_id {
                        break candidate.clone();
                    }
                }
            } else {
                String::new()
            };

            table.push_row(vec![
                personnel_id,
                format!("{} {}", first, last),
                role.to_string(),
                department.to_string(),
                email,
                phone,
                clearance.to_string(),
                format_date(hire_date),
                supervisor,
            ]);
        }
        table
    }
}

// ============================================================================
// Sampling helpers
// ============================================================================

fn pick<'a, T>(rng: &mut ChaCha8Rng, items: &'a [T]) -> &'a T {
    &items[rng.random_range(0..items.len())]
}

/// Weighted index draw via cumulative weights.
fn weighted_index(rng: &mut ChaCha8Rng, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    let draw = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, &weight) in weights.iter().enumerate() {
        cumulative += weight;
        if draw <= cumulative {
            return i;
        }
    }
    weights.len() - 1
}

/// Draws `k` distinct items via a partial Fisher-Yates shuffle.
fn sample_distinct(rng: &mut ChaCha8Rng, items: &[&str], k: usize) -> Vec<String> {
    let mut indices: Vec<usize> = (0..items.len()).collect();
    let k = k.min(items.len());
    for i in 0..k {
        let j = rng.random_range(i..indices.len());
        indices.swap(i, j);
    }
    indices[..k].iter().map(|&i| items[i].to_string()).collect()
}

/// Uniform date in the inclusive window.
fn date_between(rng: &mut ChaCha8Rng, start: NaiveDate, end: NaiveDate) -> NaiveDate {
    let span = (end - start).num_days().max(0);
    start + Duration::days(rng.random_range(0..=span))
}

fn date_in_year(rng: &mut ChaCha8Rng, year: i32) -> NaiveDate {
    date_between(rng, date_constant(year, 1, 1), date_constant(year, 12, 31))
}

fn date_constant(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date constant")
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Federal fiscal calendar: the fiscal year starts October 1 and Q1 is
/// October through December; January through September belong to the prior
/// fiscal year label.
fn fiscal_calendar(date: NaiveDate) -> (i32, u8) {
    let year = if date.month() >= 10 {
        date.year()
    } else {
        date.year() - 1
    };
    let quarter = match date.month() {
        10..=12 => 1,
        1..=3 => 2,
        4..=6 => 3,
        _ => 4,
    };
    (year, quarter)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// Fake-flavored text sampling
// ============================================================================

fn person_name_parts(rng: &mut ChaCha8Rng) -> (&'static str, &'static str) {
    let first_names = [
        "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "William",
        "Elizabeth", "David", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas",
        "Sarah", "Charles", "Karen", "Dana", "Morgan", "Alex", "Jordan",
    ];
    let last_names = [
        "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
        "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Taylor",
        "Moore", "Jackson", "Martin", "Lee", "Harris", "Clark", "Lewis", "Walker",
    ];
    (
        first_names[rng.random_range(0..first_names.len())],
        last_names[rng.random_range(0..last_names.len())],
    )
}

fn company_name(rng: &mut ChaCha8Rng) -> String {
    let stems = [
        "Harris", "Vector", "Summit", "Keystone", "Liberty", "Pinnacle", "Frontier", "Sterling",
        "Cascade", "Meridian", "Ironwood", "Bluepeak", "Northgate", "Redstone", "Silverline",
        "Crestview",
    ];
    let suffixes = [
        "Systems",
        "Technologies",
        "Solutions",
        "Industries",
        "Group",
        "Associates",
        "Dynamics",
        "Engineering",
    ];
    let stem = stems[rng.random_range(0..stems.len())];
    let suffix = suffixes[rng.random_range(0..suffixes.len())];
    format!("{} {}", stem, suffix)
}

/// Lowercase alphanumeric slug for email and website hosts.
fn slugify(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn street_address(rng: &mut ChaCha8Rng) -> String {
    let street_names = [
        "Oak", "Main", "Maple", "Cedar", "Washington", "Lincoln", "Jackson", "Franklin",
        "Jefferson", "Madison", "Ridge", "Park",
    ];
    let street_suffixes = ["Street", "Avenue", "Boulevard", "Drive", "Road", "Lane", "Way", "Court"];
    format!(
        "{} {} {}",
        rng.random_range(100..=9999),
        street_names[rng.random_range(0..street_names.len())],
        street_suffixes[rng.random_range(0..street_suffixes.len())]
    )
}

const CITIES: [&str; 16] = [
    "Arlington",
    "Springfield",
    "Huntsville",
    "Colorado Springs",
    "San Diego",
    "Norfolk",
    "Dayton",
    "El Segundo",
    "Fairfax",
    "Annapolis",
    "Bethesda",
    "Crystal City",
    "Fort Worth",
    "Orlando",
    "Tucson",
    "Albuquerque",
];

const STATE_ABBRS: [&str; 20] = [
    "VA", "MD", "CA", "TX", "FL", "AL", "CO", "OH", "NM", "AZ", "WA", "PA", "GA", "NC", "SC",
    "MA", "NY", "NJ", "UT", "MN",
];

const JOB_TITLES: [&str; 12] = [
    "Contracts Director",
    "Business Development Manager",
    "Capture Manager",
    "Program Director",
    "Chief Engineer",
    "Operations Manager",
    "Proposal Manager",
    "Account Executive",
    "Pricing Analyst",
    "Delivery Lead",
    "Compliance Officer",
    "General Manager",
];

fn phone_number(rng: &mut ChaCha8Rng) -> String {
    format!(
        "({}) 555-{:04}",
        rng.random_range(200..=989),
        rng.random_range(0..10000)
    )
}

/// Business jargon in the flavor of fake's `bs()`.
fn business_phrase(rng: &mut ChaCha8Rng) -> String {
    let verbs = [
        "streamline", "integrate", "optimize", "modernize", "accelerate", "consolidate",
        "harden", "sustain", "synchronize", "deliver", "field", "validate", "recapitalize",
        "automate", "interoperate",
    ];
    let adjectives = [
        "mission-critical",
        "interoperable",
        "next-generation",
        "resilient",
        "distributed",
        "secure",
        "scalable",
        "expeditionary",
        "networked",
        "multi-domain",
        "tactical",
        "enterprise",
        "airborne",
        "logistics",
        "maritime",
    ];
    let nouns = [
        "architectures",
        "capabilities",
        "platforms",
        "sustainment",
        "supply chains",
        "deployments",
        "infrastructures",
        "communications",
        "sensors",
        "readiness",
        "avionics",
        "interfaces",
        "systems",
        "networks",
        "payloads",
    ];
    format!(
        "{} {} {}",
        verbs[rng.random_range(0..verbs.len())],
        adjectives[rng.random_range(0..adjectives.len())],
        nouns[rng.random_range(0..nouns.len())]
    )
}

/// Title-cased program phrase in the flavor of fake's `catch_phrase()`.
fn catch_phrase(rng: &mut ChaCha8Rng) -> String {
    let leads = [
        "Adaptive", "Integrated", "Persistent", "Advanced", "Unified", "Strategic", "Agile",
        "Autonomous", "Assured", "Joint",
    ];
    let middles = [
        "mission", "sensor", "logistics", "combat", "spectrum", "maritime", "cyber", "ground",
        "airborne", "space",
    ];
    let tails = [
        "framework", "initiative", "capability", "network", "platform", "architecture",
        "modernization", "enterprise", "system", "pipeline",
    ];
    format!(
        "{} {} {}",
        leads[rng.random_range(0..leads.len())],
        middles[rng.random_range(0..middles.len())],
        tails[rng.random_range(0..tails.len())]
    )
}

fn sentence(rng: &mut ChaCha8Rng) -> String {
    let words = [
        "contract", "delivery", "schedule", "funding", "review", "milestone", "vendor",
        "performance", "baseline", "scope", "period", "option", "invoice", "labor", "material",
        "travel", "support", "effort", "task", "order", "ceiling", "award", "obligation",
        "program", "office", "quarterly", "annual", "incremental", "approved", "pending",
    ];
    let length = rng.random_range(6..=10);
    let mut parts = Vec::with_capacity(length);
    for _ in 0..length {
        parts.push(words[rng.random_range(0..words.len())]);
    }
    let mut text = parts.join(" ");
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text.push('.');
    text
}

fn paragraph(rng: &mut ChaCha8Rng, sentences: usize) -> String {
    (0..sentences)
        .map(|_| sentence(rng))
        .collect::<Vec<_>>()
        .join(" ")
}
