//! Demo datasets: a seeded payment generator, a small people table and departments with
//! their employees as sub rows.

use chrono::{Days, NaiveDate};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::column::{CellFormat, ColumnDef, FilterKind, format_currency, options};
use crate::table::TableOptions;
use crate::value::{CellValue, Record};

pub const DEFAULT_SEED: u64 = 12345;
pub const DEFAULT_ROWS: usize = 1000;

const STATUSES: [&str; 6] = ["success", "success", "success", "pending", "processing", "failed"];
const CATEGORIES: [&str; 6] = ["subscription", "one-time", "one-time", "one-time", "refund", "fee"];
const PRIORITIES: [&str; 6] = ["low", "low", "medium", "medium", "high", "urgent"];

const SUB_PAYMENT_CATEGORIES: [&str; 20] = [
    "Service Fee", "Processing Fee", "Tax", "Subscription", "Setup Fee",
    "Monthly Plan", "Add-ons", "Support", "Maintenance", "License",
    "API Usage", "Storage", "Bandwidth", "Premium Features", "Analytics",
    "Backup", "Security", "Compliance", "Training", "Consulting",
];

const COMMON_TAGS: [&str; 17] = [
    "premium", "monthly", "annual", "enterprise", "startup", "trial",
    "conversion", "upgrade", "downgrade", "migration", "onboarding",
    "setup", "maintenance", "support", "api", "integration", "custom",
];

const FIRST_NAMES: [&str; 12] = [
    "ken", "abe", "monserrat", "silas", "carmella", "jason", "maria", "li", "noah", "olivia",
    "priya", "tomas",
];
const LAST_NAMES: [&str; 10] = [
    "smith", "jones", "garcia", "müller", "chen", "okafor", "rossi", "nguyen", "khan", "berg",
];
const DOMAINS: [&str; 5] = ["gmail.com", "yahoo.com", "hotmail.com", "example.com", "mail.org"];

/// Generated dates count from this day, so a seed always yields the same rows.
pub fn anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubPayment {
    pub id: String,
    pub description: &'static str,
    pub amount: f64,
    pub date: NaiveDate,
    pub category: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: String,
    pub amount: f64,
    pub status: &'static str,
    pub email: String,
    pub category: &'static str,
    pub priority: Option<&'static str>,
    pub tags: Vec<String>,
    pub created_at: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub sub_payments: Vec<SubPayment>,
}

impl Record for Payment {
    fn field(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::text(&self.id),
            "amount" => CellValue::Number(self.amount),
            "status" => CellValue::text(self.status),
            "email" => CellValue::text(&self.email),
            "category" => CellValue::text(self.category),
            "priority" => self.priority.into(),
            "tags" => CellValue::Tags(self.tags.clone()),
            "createdAt" => self.created_at.into(),
            "dueDate" => self.due_date.into(),
            _ => CellValue::Null,
        }
    }
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

fn alphanumeric(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn email(rng: &mut StdRng) -> String {
    let first = pick(rng, &FIRST_NAMES);
    let last = pick(rng, &LAST_NAMES);
    let domain = pick(rng, &DOMAINS);
    match rng.gen_range(0..3) {
        0 => format!("{first}.{last}@{domain}"),
        1 => format!("{first}_{last}{}@{domain}", rng.gen_range(1..100)),
        _ => format!("{first}{}@{domain}", rng.gen_range(10..1000)),
    }
}

fn days_before(anchor: NaiveDate, days: u64) -> NaiveDate {
    anchor.checked_sub_days(Days::new(days)).unwrap_or(anchor)
}

fn days_after(anchor: NaiveDate, days: u64) -> NaiveDate {
    anchor.checked_add_days(Days::new(days)).unwrap_or(anchor)
}

/// Splits `total` over 3 to 8 parts. The last part takes the remainder, no part is below 1.
fn generate_sub_payments(rng: &mut StdRng, payment_id: &str, total: i64) -> Vec<SubPayment> {
    let count = rng.gen_range(3..=8);
    let base = total / count;
    let mut remaining = total;
    let anchor = anchor_date();

    (0..count)
        .map(|i| {
            let amount = if i == count - 1 {
                remaining
            } else {
                let low = base * 3 / 10;
                let high = (base * 3 / 2).max(low);
                rng.gen_range(low..=high)
            };
            remaining -= amount;
            SubPayment {
                id: format!("{payment_id}-sub-{}", i + 1),
                description: pick(rng, &SUB_PAYMENT_CATEGORIES),
                amount: amount.max(1) as f64,
                date: days_before(anchor, rng.gen_range(0..30)),
                category: pick(rng, &SUB_PAYMENT_CATEGORIES),
            }
        })
        .collect()
}

fn generate_payment(rng: &mut StdRng, id: String) -> Payment {
    let amount: i64 = rng.gen_range(50..=5000);
    let anchor = anchor_date();
    let tag_count = rng.gen_range(0..=4);
    let tags = COMMON_TAGS
        .choose_multiple(rng, tag_count)
        .map(|t| t.to_string())
        .collect();

    Payment {
        status: pick(rng, &STATUSES),
        email: email(rng),
        category: pick(rng, &CATEGORIES),
        priority: Some(pick(rng, &PRIORITIES)),
        tags,
        created_at: Some(days_before(anchor, rng.gen_range(0..90))),
        due_date: Some(days_after(anchor, rng.gen_range(1..=365))),
        sub_payments: generate_sub_payments(rng, &id, amount),
        amount: amount as f64,
        id,
    }
}

/// `count` payments; the same seed always produces the same payments.
pub fn generate_payments(count: usize, seed: u64) -> Vec<Payment> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let id = alphanumeric(&mut rng, 8);
            generate_payment(&mut rng, id)
        })
        .collect()
}

pub fn payment_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::selector(),
        ColumnDef::field("id", "Payment ID")
            .filter(FilterKind::Text)
            .sizing(120, 100, 200),
        ColumnDef::field("email", "Email")
            .filter(FilterKind::Text)
            .sizing(250, 200, 400),
        ColumnDef::field("amount", "Amount")
            .filter(FilterKind::NumericRange)
            .format(CellFormat::Currency)
            .sizing(130, 100, 200),
        ColumnDef::field("status", "Status")
            .filter(FilterKind::Select(options(&[
                ("pending", "Pending"),
                ("processing", "Processing"),
                ("success", "Success"),
                ("failed", "Failed"),
            ])))
            .format(CellFormat::Label)
            .sizing(120, 100, 180),
        ColumnDef::field("category", "Category")
            .filter(FilterKind::Select(options(&[
                ("subscription", "Subscription"),
                ("one-time", "One-time"),
                ("refund", "Refund"),
                ("fee", "Fee"),
            ])))
            .sizing(130, 100, 180),
        ColumnDef::field("priority", "Priority")
            .filter(FilterKind::Select(options(&[
                ("low", "Low"),
                ("medium", "Medium"),
                ("high", "High"),
                ("urgent", "Urgent"),
            ])))
            .placeholder("N/A")
            .sizing(110, 90, 160),
        ColumnDef::field("tags", "Tags")
            .filter(FilterKind::MultiSelect(
                COMMON_TAGS.iter().map(|t| crate::column::FilterOption::new(*t, *t)).collect(),
            ))
            .enable_sorting(false)
            .sizing(260, 200, 400),
        ColumnDef::field("createdAt", "Created")
            .filter(FilterKind::DateRange)
            .format(CellFormat::Date)
            .placeholder("No date")
            .sizing(140, 120, 180),
        ColumnDef::field("dueDate", "Due Date")
            .filter(FilterKind::DateRange)
            .format(CellFormat::Date)
            .placeholder("No date")
            .sizing(140, 120, 180),
    ]
}

pub fn payment_options() -> TableOptions {
    TableOptions::default()
        .filter_column("email")
        .filter_placeholder("Filter by email...")
        .enable_column_search(true)
        .enable_column_reordering(true)
}

pub fn payment_details(payment: &Payment) -> Vec<String> {
    let mut lines = vec![format!("Sub payments ({} items)", payment.sub_payments.len())];
    lines.extend(payment.sub_payments.iter().map(|sub| {
        format!(
            "{:<16} {:<18} {:>12}  {}  {}",
            sub.id,
            sub.description,
            format_currency(sub.amount),
            sub.date.format("%Y-%m-%d"),
            sub.category
        )
    }));
    lines
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub age: u32,
    pub visits: u32,
    pub status: &'static str,
    pub progress: u32,
}

impl Record for Person {
    fn field(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::text(self.id),
            "firstName" => CellValue::text(self.first_name),
            "lastName" => CellValue::text(self.last_name),
            "age" => self.age.into(),
            "visits" => self.visits.into(),
            "status" => CellValue::text(self.status),
            "progress" => self.progress.into(),
            _ => CellValue::Null,
        }
    }
}

pub fn people() -> Vec<Person> {
    let person = |id, first_name, last_name, age, visits, status, progress| Person {
        id,
        first_name,
        last_name,
        age,
        visits,
        status,
        progress,
    };
    vec![
        person("1", "John", "Doe", 30, 100, "relationship", 50),
        person("2", "Jane", "Smith", 25, 200, "single", 75),
        person("3", "Bob", "Johnson", 35, 150, "complicated", 25),
        person("4", "Alice", "Brown", 28, 300, "relationship", 90),
        person("5", "Charlie", "Wilson", 32, 80, "single", 40),
        person("6", "Diana", "Davis", 27, 250, "complicated", 60),
        person("7", "Eve", "Miller", 29, 120, "relationship", 85),
        person("8", "Frank", "Garcia", 31, 180, "single", 30),
    ]
}

pub fn people_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::selector(),
        ColumnDef::field("firstName", "First Name").filter(FilterKind::Text),
        ColumnDef::field("lastName", "Last Name").filter(FilterKind::Text),
        ColumnDef::field("age", "Age").filter(FilterKind::NumericRange),
        ColumnDef::field("visits", "Visits").filter(FilterKind::NumericRange),
        ColumnDef::field("status", "Status").filter(FilterKind::Select(options(&[
            ("relationship", "Relationship"),
            ("complicated", "Complicated"),
            ("single", "Single"),
        ]))),
        ColumnDef::field("progress", "Profile Progress").filter(FilterKind::NumericRange),
    ]
}

pub fn people_options() -> TableOptions {
    TableOptions::default()
        .filter_column("firstName")
        .filter_placeholder("Filter by first name...")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub id: &'static str,
    pub name: &'static str,
    pub manager: &'static str,
    pub budget: f64,
    /// Always `OrgRow::Employee` entries.
    pub employees: Vec<OrgRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: &'static str,
    pub name: &'static str,
    pub position: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
    pub salary: f64,
    pub location: &'static str,
}

/// Departments with their employees nested below them.
#[derive(Debug, Clone, PartialEq)]
pub enum OrgRow {
    Department(Department),
    Employee(Employee),
}

impl Record for OrgRow {
    fn field(&self, key: &str) -> CellValue {
        match (self, key) {
            (OrgRow::Department(d), "id") => CellValue::text(d.id),
            (OrgRow::Department(d), "name") => CellValue::text(d.name),
            (OrgRow::Department(d), "manager") => CellValue::text(d.manager),
            (OrgRow::Department(d), "budget") => CellValue::Number(d.budget),
            (OrgRow::Department(d), "employees") => (d.employees.len() as u32).into(),
            (OrgRow::Employee(e), "id") => CellValue::text(e.id),
            (OrgRow::Employee(e), "name") => CellValue::text(e.name),
            (OrgRow::Employee(e), "budget") => CellValue::Number(e.salary),
            _ => CellValue::Null,
        }
    }
}

pub fn org_children(row: &OrgRow) -> Option<&[OrgRow]> {
    match row {
        OrgRow::Department(d) => Some(&d.employees),
        OrgRow::Employee(_) => None,
    }
}

pub fn org_details(row: &OrgRow) -> Vec<String> {
    match row {
        OrgRow::Department(d) if d.employees.is_empty() => {
            vec!["No employees found for this department.".to_string()]
        }
        OrgRow::Department(d) => {
            let mut lines = vec![format!(
                "{:<16} {:<22} {:<28} {:<13} {:<15} {:>12}",
                "Name", "Position", "Email", "Phone", "Location", "Salary"
            )];
            lines.extend(d.employees.iter().filter_map(|row| match row {
                OrgRow::Employee(e) => Some(format!(
                    "{:<16} {:<22} {:<28} {:<13} {:<15} {:>12}",
                    e.name,
                    e.position,
                    e.email,
                    e.phone,
                    e.location,
                    format_currency(e.salary)
                )),
                OrgRow::Department(_) => None,
            }));
            lines
        }
        OrgRow::Employee(e) => vec![format!(
            "{} | {} | {} | {}",
            e.position, e.email, e.phone, e.location
        )],
    }
}

pub fn departments() -> Vec<OrgRow> {
    let employee = |id, name, position, email, phone, salary, location| {
        OrgRow::Employee(Employee {
            id,
            name,
            position,
            email,
            phone,
            salary,
            location,
        })
    };
    vec![
        OrgRow::Department(Department {
            id: "1",
            name: "Engineering",
            manager: "John Smith",
            budget: 500000.0,
            employees: vec![
                employee("1-1", "Alice Johnson", "Senior Developer", "alice.johnson@company.com", "+1-555-0101", 120000.0, "New York"),
                employee("1-2", "Bob Wilson", "Frontend Developer", "bob.wilson@company.com", "+1-555-0102", 95000.0, "San Francisco"),
                employee("1-3", "Carol Davis", "Backend Developer", "carol.davis@company.com", "+1-555-0103", 110000.0, "Seattle"),
            ],
        }),
        OrgRow::Department(Department {
            id: "2",
            name: "Marketing",
            manager: "Sarah Brown",
            budget: 200000.0,
            employees: vec![
                employee("2-1", "David Lee", "Marketing Manager", "david.lee@company.com", "+1-555-0201", 85000.0, "Los Angeles"),
                employee("2-2", "Emma Taylor", "Content Specialist", "emma.taylor@company.com", "+1-555-0202", 65000.0, "Chicago"),
            ],
        }),
        OrgRow::Department(Department {
            id: "3",
            name: "Sales",
            manager: "Mike Johnson",
            budget: 300000.0,
            employees: vec![
                employee("3-1", "Frank Miller", "Sales Director", "frank.miller@company.com", "+1-555-0301", 130000.0, "Boston"),
                employee("3-2", "Grace Wilson", "Account Manager", "grace.wilson@company.com", "+1-555-0302", 75000.0, "Miami"),
                employee("3-3", "Henry Garcia", "Sales Representative", "henry.garcia@company.com", "+1-555-0303", 60000.0, "Denver"),
            ],
        }),
    ]
}

pub fn department_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::selector(),
        ColumnDef::field("name", "Department").filter(FilterKind::Text),
        ColumnDef::field("manager", "Manager")
            .filter(FilterKind::Text)
            .placeholder("-"),
        ColumnDef::field("budget", "Budget")
            .filter(FilterKind::NumericRange)
            .format(CellFormat::Currency),
        ColumnDef::field("employees", "Employees").sizing(100, 60, 150),
    ]
}

pub fn department_options() -> TableOptions {
    TableOptions::default()
        .filter_column("name")
        .filter_placeholder("Filter departments...")
}
