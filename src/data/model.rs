use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A cell of the customer table: either a number or a label.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Text(String),
}

/// `-0.0` and `0.0` are the same cell value.
fn canonical(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

// -- Manual Eq/Ord/Hash so we can put Value in BTreeSet and HashMap --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => canonical(*a).total_cmp(&canonical(*b)),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Number(_), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Number(_)) => Ordering::Greater,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Number(v) => canonical(*v).to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(canonical(v))
    }
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Well-known columns of the customer file
// ---------------------------------------------------------------------------

/// Headers of the bank customer file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    ClientNum,
    Status,
    Age,
    Sex,
    Dependents,
    Education,
    MaritalStatus,
    IncomeBracket,
    CardCategory,
    MonthsAsCustomer,
    ProductsHeld,
    InactiveMonths12m,
    Contacts12m,
    CreditLimit,
    ConsumedLimit,
    AvailableLimit,
    TransactionValueChange,
    TransactionValue12m,
    TransactionCount12m,
    TransactionCountChange,
    UtilizationRatio,
}

impl Column {
    pub const ALL: [Column; 21] = [
        Column::ClientNum,
        Column::Status,
        Column::Age,
        Column::Sex,
        Column::Dependents,
        Column::Education,
        Column::MaritalStatus,
        Column::IncomeBracket,
        Column::CardCategory,
        Column::MonthsAsCustomer,
        Column::ProductsHeld,
        Column::InactiveMonths12m,
        Column::Contacts12m,
        Column::CreditLimit,
        Column::ConsumedLimit,
        Column::AvailableLimit,
        Column::TransactionValueChange,
        Column::TransactionValue12m,
        Column::TransactionCount12m,
        Column::TransactionCountChange,
        Column::UtilizationRatio,
    ];

    /// Columns a file must carry to be accepted.
    pub const REQUIRED: [Column; 7] = [
        Column::ClientNum,
        Column::Status,
        Column::IncomeBracket,
        Column::Age,
        Column::CreditLimit,
        Column::TransactionValue12m,
        Column::UtilizationRatio,
    ];

    /// The identifier column, dropped on load.
    pub const IDENTIFIER: Column = Column::ClientNum;

    pub fn header(self) -> &'static str {
        match self {
            Column::ClientNum => "CLIENTNUM",
            Column::Status => "Categoria",
            Column::Age => "Idade",
            Column::Sex => "Sexo",
            Column::Dependents => "Dependentes",
            Column::Education => "Educação",
            Column::MaritalStatus => "Estado Civil",
            Column::IncomeBracket => "Faixa Salarial Anual",
            Column::CardCategory => "Categoria Cartão",
            Column::MonthsAsCustomer => "Meses como Cliente",
            Column::ProductsHeld => "Produtos Contratados",
            Column::InactiveMonths12m => "Inatividade 12m",
            Column::Contacts12m => "Contatos 12m",
            Column::CreditLimit => "Limite",
            Column::ConsumedLimit => "Limite Consumido",
            Column::AvailableLimit => "Limite Disponível",
            Column::TransactionValueChange => "Mudanças Transacoes_Q4_Q1",
            Column::TransactionValue12m => "Valor Transacoes 12m",
            Column::TransactionCount12m => "Qtde Transacoes 12m",
            Column::TransactionCountChange => "Mudança Qtde Transações_Q4_Q1",
            Column::UtilizationRatio => "Taxa de Utilização Cartão",
        }
    }

    pub fn from_header(header: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.header() == header)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Categorical,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column list of a loaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnInfo>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Schema { columns }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look up a column by name, failing closed on anything unknown.
    pub fn column(&self, name: &str) -> Result<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| DashboardError::UnknownColumn(name.to_string()))
    }

    /// Like [`Schema::column`], but also requires the column to be numeric.
    pub fn numeric_column(&self, name: &str) -> Result<&ColumnInfo> {
        let info = self.column(name)?;
        match info.kind {
            ColumnKind::Numeric => Ok(info),
            ColumnKind::Categorical => Err(DashboardError::NotNumeric(name.to_string())),
        }
    }

    pub fn numeric_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
    }

    pub fn categorical_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Categorical)
            .map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CustomerRecord – one row of the table
// ---------------------------------------------------------------------------

/// One customer. Every schema column has a value; the identifier is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub fields: BTreeMap<String, Value>,
}

impl CustomerRecord {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed unique-value indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<CustomerRecord>,
    pub schema: Schema,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<Value>>,
}

impl Dataset {
    /// Build the unique-value index from the loaded records.
    pub fn from_records(schema: Schema, records: Vec<CustomerRecord>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<Value>> = schema
            .names()
            .map(|name| (name.to_string(), BTreeSet::new()))
            .collect();

        for record in &records {
            for (col, val) in &record.fields {
                if let Some(set) = unique_values.get_mut(col) {
                    set.insert(val.clone());
                }
            }
        }

        Dataset {
            records,
            schema,
            unique_values,
        }
    }

    /// Remove a column from the schema and every record. Removing a column
    /// that is not present leaves the dataset unchanged.
    pub fn without_column(mut self, name: &str) -> Self {
        if !self.schema.contains(name) {
            return self;
        }
        self.schema.columns.retain(|c| c.name != name);
        self.unique_values.remove(name);
        for record in &mut self.records {
            record.fields.remove(name);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Dataset {
        let schema = Schema::new(vec![
            ColumnInfo {
                name: "Categoria".into(),
                kind: ColumnKind::Categorical,
            },
            ColumnInfo {
                name: "Idade".into(),
                kind: ColumnKind::Numeric,
            },
        ]);
        let records = [("Cliente", 40.0), ("Cancelado", 52.0), ("Cliente", 40.0)]
            .into_iter()
            .map(|(cat, age)| CustomerRecord {
                fields: BTreeMap::from([
                    ("Categoria".to_string(), Value::from(cat)),
                    ("Idade".to_string(), Value::Number(age)),
                ]),
            })
            .collect();
        Dataset::from_records(schema, records)
    }

    #[test]
    fn numbers_sort_before_text() {
        let mut set = BTreeSet::new();
        set.insert(Value::from("b"));
        set.insert(Value::Number(3.0));
        set.insert(Value::from("a"));
        set.insert(Value::Number(-1.0));
        let ordered: Vec<String> = set.iter().map(Value::to_string).collect();
        assert_eq!(ordered, ["-1", "3", "a", "b"]);
    }

    #[test]
    fn signed_zero_is_one_value() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let (pos, neg) = (Value::Number(0.0), Value::Number(-0.0));
        assert_eq!(pos, neg);
        assert_eq!(pos.cmp(&neg), std::cmp::Ordering::Equal);
        let hash = |v: &Value| {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&pos), hash(&neg));
        assert_eq!(BTreeSet::from([pos, neg]).len(), 1);
    }

    #[test]
    fn whole_numbers_display_without_fraction() {
        assert_eq!(Value::Number(12691.0).to_string(), "12691");
        assert_eq!(Value::Number(0.061).to_string(), "0.061");
    }

    #[test]
    fn unique_values_are_indexed_per_column() {
        let ds = tiny();
        assert_eq!(ds.unique_values["Categoria"].len(), 2);
        assert_eq!(ds.unique_values["Idade"].len(), 2);
    }

    #[test]
    fn unknown_column_lookup_fails_closed() {
        let ds = tiny();
        assert!(matches!(
            ds.schema.column("Renda"),
            Err(DashboardError::UnknownColumn(name)) if name == "Renda"
        ));
        assert!(matches!(
            ds.schema.numeric_column("Categoria"),
            Err(DashboardError::NotNumeric(_))
        ));
        assert!(ds.schema.numeric_column("Idade").is_ok());
    }

    #[test]
    fn dropping_a_column_twice_is_a_no_op() {
        let once = tiny().without_column("Idade");
        let twice = once.clone().without_column("Idade");
        assert_eq!(once, twice);
        assert_eq!(twice.schema.len(), 1);
        assert!(twice.records.iter().all(|r| r.get("Idade").is_none()));
    }

    #[test]
    fn headers_round_trip_through_the_column_enum() {
        for col in Column::ALL {
            assert_eq!(Column::from_header(col.header()), Some(col));
        }
        assert_eq!(Column::from_header("nope"), None);
    }
}
