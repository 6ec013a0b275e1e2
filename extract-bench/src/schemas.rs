//! Structured-output schemas sent with each benchmark request

use extract_judge::Benchmark;
use serde_json::{json, Map, Value};

use crate::providers::ResponseFormat;

const CLAIM_CHANNELS: &[&str] = &["Email", "Phone", "Portal", "In-Person"];

const COVERAGE_TYPES: &[&str] = &["Property", "Auto", "Liability", "Health", "Travel", "Other"];

const OBJECT_TYPES: &[&str] = &["Vehicle", "Building", "Person", "Other"];

const INCIDENT_TYPES: &[&str] = &[
    "rear_end_collision",
    "side_impact_collision",
    "head_on_collision",
    "parking_lot_collision",
    "house_fire",
    "kitchen_fire",
    "electrical_fire",
    "burst_pipe_flood",
    "storm_damage",
    "roof_leak",
    "slip_and_fall",
    "property_injury",
    "product_liability",
    "theft_burglary",
    "vandalism",
];

const LOCATION_TYPES: &[&str] = &[
    "intersection",
    "highway",
    "parking_lot",
    "driveway",
    "residential_street",
    "residence_interior",
    "residence_exterior",
    "commercial_property",
    "public_property",
];

pub const ENTITY_FIELDS: &[&str] = &[
    "Company", "Date", "Location", "Money", "Person", "Product", "Quantity",
];

pub const PII_FIELDS: &[&str] = &[
    "ACCOUNTNAME",
    "ACCOUNTNUMBER",
    "AGE",
    "AMOUNT",
    "BIC",
    "BITCOINADDRESS",
    "BUILDINGNUMBER",
    "CITY",
    "COMPANYNAME",
    "COUNTY",
    "CREDITCARDCVV",
    "CREDITCARDISSUER",
    "CREDITCARDNUMBER",
    "CURRENCY",
    "CURRENCYCODE",
    "CURRENCYNAME",
    "CURRENCYSYMBOL",
    "DATE",
    "DOB",
    "EMAIL",
    "ETHEREUMADDRESS",
    "EYECOLOR",
    "FIRSTNAME",
    "GENDER",
    "HEIGHT",
    "IBAN",
    "IP",
    "IPV4",
    "IPV6",
    "JOBAREA",
    "JOBTITLE",
    "JOBTYPE",
    "LASTNAME",
    "LITECOINADDRESS",
    "MAC",
    "MASKEDNUMBER",
    "MIDDLENAME",
    "NEARBYGPSCOORDINATE",
    "ORDINALDIRECTION",
    "PASSWORD",
    "PHONEIMEI",
    "PHONENUMBER",
    "PIN",
    "PREFIX",
    "SECONDARYADDRESS",
    "SEX",
    "SSN",
    "STATE",
    "STREET",
    "TIME",
    "URL",
    "USERAGENT",
    "USERNAME",
    "VEHICLEVIN",
    "VEHICLEVRM",
    "ZIPCODE",
];

/// Name the schema is registered under with the endpoint
pub fn schema_name(benchmark: Benchmark) -> &'static str {
    match benchmark {
        Benchmark::DataTableAnalysis => "StructuredSynthetic",
        Benchmark::FinancialEntities => "ExtractedEntities",
        Benchmark::InsuranceClaims => "InsuranceClaim",
        Benchmark::PiiExtraction => "PII",
    }
}

/// JSON Schema for one benchmark's extraction target
pub fn response_schema(benchmark: Benchmark) -> Value {
    match benchmark {
        Benchmark::DataTableAnalysis => data_table_schema(),
        Benchmark::FinancialEntities => object(
            ENTITY_FIELDS
                .iter()
                .map(|f| (*f, nullable(json!({"type": "array", "items": {"type": "string"}}))))
                .collect(),
        ),
        Benchmark::InsuranceClaims => insurance_claim_schema(),
        Benchmark::PiiExtraction => object(
            PII_FIELDS
                .iter()
                .map(|f| (*f, json!({"type": ["string", "null"]})))
                .collect(),
        ),
    }
}

/// Response format for a benchmark.
///
/// The table schema uses open maps for per-column statistics, which strict
/// mode rejects, so only the closed schemas are sent as strict.
pub fn response_format(benchmark: Benchmark) -> ResponseFormat {
    ResponseFormat::json_schema(schema_name(benchmark), response_schema(benchmark))
        .strict(benchmark != Benchmark::DataTableAnalysis)
}

fn data_table_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "num_rows": {"type": "integer"},
            "num_columns": {"type": "integer"},
            "column_types": {
                "type": "object",
                "additionalProperties": {"type": "string", "enum": ["str", "int", "float"]}
            },
            "column_max": {
                "type": "object",
                "additionalProperties": {"type": ["number", "null"]}
            },
            "column_min": {
                "type": "object",
                "additionalProperties": {"type": ["number", "null"]}
            },
            "identifier_first": {"type": ["string", "null"]},
            "identifier_last": {"type": ["string", "null"]},
            "identifier_shortest": {"type": ["string", "null"]}
        },
        "required": [
            "num_rows",
            "num_columns",
            "column_types",
            "column_max",
            "column_min",
            "identifier_first",
            "identifier_last",
            "identifier_shortest"
        ]
    })
}

fn insurance_claim_schema() -> Value {
    let header = object(vec![
        ("claim_id", described(string(), "Claim ID in format CLM-XXXXXX, where X is a digit")),
        ("report_date", described(date(), "Date claim was reported")),
        ("incident_date", described(date(), "Date incident occurred")),
        ("reported_by", described(string(), "Full name of person reporting claim")),
        ("channel", described(one_of(CLAIM_CHANNELS), "Channel used to report claim")),
    ]);

    let policy = object(vec![
        (
            "policy_number",
            described(string(), "Policy number in format POL-XXXXXXXXX, where X is a digit"),
        ),
        ("policyholder_name", described(string(), "Full legal name on policy")),
        ("coverage_type", described(one_of(COVERAGE_TYPES), "Type of insurance coverage")),
        ("effective_date", described(date(), "Policy effective start date")),
        ("expiration_date", described(date(), "Policy expiration end date")),
    ]);

    let insured_object = object(vec![
        (
            "object_id",
            described(
                string(),
                "Unique identifier for insured object. For vehicles, use VIN format \
                 (e.g., VIN12345678901234567). For buildings, use PROP-XXXXXX format. \
                 For liability, use LIAB-XXXXXX format. For other objects, use \
                 OBJ-XXXXXX format, where X is a digit",
            ),
        ),
        ("object_type", described(one_of(OBJECT_TYPES), "Type of insured object")),
        (
            "make_model",
            described(
                nullable(string()),
                "Make and model for vehicles, or building type for property",
            ),
        ),
        (
            "year",
            described(
                nullable(json!({"type": "integer"})),
                "Year for vehicles or year built for buildings",
            ),
        ),
        (
            "location_address",
            described(
                nullable(string()),
                "Full street address where object is located or originated from",
            ),
        ),
        (
            "estimated_value",
            described(
                nullable(json!({"type": "integer"})),
                "Estimated monetary value in USD without currency symbol",
            ),
        ),
    ]);

    let incident = object(vec![
        (
            "incident_type",
            described(one_of(INCIDENT_TYPES), "Specific standardized incident type"),
        ),
        (
            "location_type",
            described(
                one_of(LOCATION_TYPES),
                "Standardized location type where incident occurred",
            ),
        ),
        (
            "estimated_damage_amount",
            described(
                nullable(json!({"type": "integer"})),
                "Estimated damage in USD without currency symbol",
            ),
        ),
        (
            "police_report_number",
            described(nullable(string()), "Police report number if applicable"),
        ),
    ]);

    object(vec![
        ("header", described(header, "Basic claim information")),
        (
            "policy_details",
            described(any_of_null(policy), "Policy information if available"),
        ),
        (
            "insured_objects",
            described(
                nullable(json!({"type": "array", "items": insured_object})),
                "List of insured objects involved, if applicable",
            ),
        ),
        ("incident_description", described(incident, "Structured incident details")),
    ])
}

/// Closed object with every property required
fn object(properties: Vec<(&str, Value)>) -> Value {
    let required: Vec<Value> = properties.iter().map(|(k, _)| json!(k)).collect();
    let properties: Map<String, Value> = properties
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn string() -> Value {
    json!({"type": "string"})
}

fn date() -> Value {
    json!({"type": "string", "format": "date"})
}

fn one_of(values: &[&str]) -> Value {
    json!({"type": "string", "enum": values})
}

fn described(mut schema: Value, description: &str) -> Value {
    if let Some(map) = schema.as_object_mut() {
        map.insert("description".to_string(), json!(description));
    }
    schema
}

/// Widen a scalar or array schema to also accept null
fn nullable(mut schema: Value) -> Value {
    if let Some(map) = schema.as_object_mut() {
        if let Some(Value::String(ty)) = map.get("type").cloned() {
            map.insert("type".to_string(), json!([ty, "null"]));
        }
    }
    schema
}

fn any_of_null(schema: Value) -> Value {
    json!({"anyOf": [schema, {"type": "null"}]})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(schema: &Value) -> Vec<&str> {
        schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_every_benchmark_has_an_object_schema() {
        for benchmark in Benchmark::all() {
            let schema = response_schema(benchmark);
            assert_eq!(schema["type"], "object", "{}", benchmark);
            assert_eq!(schema["additionalProperties"], false);
        }
    }

    #[test]
    fn test_pii_fields_are_nullable_strings() {
        let schema = response_schema(Benchmark::PiiExtraction);
        assert_eq!(required(&schema).len(), 56);
        assert_eq!(schema["properties"]["EMAIL"]["type"], json!(["string", "null"]));
    }

    #[test]
    fn test_claim_schema_shape() {
        let schema = response_schema(Benchmark::InsuranceClaims);
        assert_eq!(
            required(&schema),
            vec!["header", "policy_details", "insured_objects", "incident_description"]
        );
        let header = &schema["properties"]["header"];
        assert_eq!(header["properties"]["channel"]["enum"], json!(CLAIM_CHANNELS));
        assert_eq!(
            schema["properties"]["insured_objects"]["type"],
            json!(["array", "null"])
        );
        let incident = &schema["properties"]["incident_description"];
        assert_eq!(incident["properties"]["incident_type"]["enum"].as_array().unwrap().len(), 15);
    }

    #[test]
    fn test_table_schema_is_not_strict() {
        assert!(!response_format(Benchmark::DataTableAnalysis).strict);
        assert!(response_format(Benchmark::PiiExtraction).strict);
        assert_eq!(response_format(Benchmark::PiiExtraction).name, "PII");
    }
}
