//! Function registry and routing table
//!
//! Operations are registered declaratively: each one gets an explicit name,
//! an ordered parameter list, and a handler. The registry is consumed exactly
//! once to build a [`RoutingTable`], which is read-only afterwards and safe to
//! share between concurrent requests without locking.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::{GatewayError, GatewayResult, InvocationError, RegistryError};
use crate::models::{OperationDescriptor, ParamSpec, ParamType, Returned};

/// A remotely callable operation.
///
/// Implementations receive their parameters already bound against the
/// declared schema, with defaults filled in.
#[async_trait]
pub trait Operation: Send + Sync {
    async fn invoke(&self, args: Arguments) -> Result<Returned, InvocationError>;
}

/// Adapter that turns an async closure into an [`Operation`]
pub struct FnOperation<F>(F);

#[async_trait]
impl<F, Fut> Operation for FnOperation<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Returned, InvocationError>> + Send + 'static,
{
    async fn invoke(&self, args: Arguments) -> Result<Returned, InvocationError> {
        (self.0)(args).await
    }
}

/// Wrap an async closure as an operation handler.
///
/// ```
/// use qka_core::{operation_fn, Returned};
///
/// let shout = operation_fn(|args| async move {
///     let text = args.str("text")?.to_uppercase();
///     Ok::<_, qka_core::InvocationError>(Returned::from(text))
/// });
/// # let _ = shout;
/// ```
pub fn operation_fn<F, Fut>(f: F) -> FnOperation<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Returned, InvocationError>> + Send + 'static,
{
    FnOperation(f)
}

/// Bound parameter set passed to a handler, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an argument
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, name: &str) -> Result<&Value, InvocationError> {
        self.raw(name)
            .ok_or_else(|| InvocationError::new(format!("missing argument: {}", name)))
    }

    pub fn str(&self, name: &str) -> Result<&str, InvocationError> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| InvocationError::new(format!("argument {} must be a string", name)))
    }

    pub fn i64(&self, name: &str) -> Result<i64, InvocationError> {
        self.require(name)?
            .as_i64()
            .ok_or_else(|| InvocationError::new(format!("argument {} must be an integer", name)))
    }

    pub fn f64(&self, name: &str) -> Result<f64, InvocationError> {
        self.require(name)?
            .as_f64()
            .ok_or_else(|| InvocationError::new(format!("argument {} must be a number", name)))
    }

    pub fn bool(&self, name: &str) -> Result<bool, InvocationError> {
        self.require(name)?
            .as_bool()
            .ok_or_else(|| InvocationError::new(format!("argument {} must be a boolean", name)))
    }

    /// Deserialize an argument into any owned type
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, InvocationError> {
        let value = self.require(name)?.clone();
        serde_json::from_value(value)
            .map_err(|e| InvocationError::new(format!("argument {}: {}", name, e)))
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values.into_iter().collect()
    }
}

/// Policy for supplied keys that match no declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownParams {
    /// Drop them (logged at debug level)
    #[default]
    Ignore,
    /// Fail the request with a validation error
    Reject,
}

/// Declarative registration of one operation
#[derive(Debug, Clone)]
pub struct OperationBuilder {
    name: String,
    description: Option<String>,
    parameters: Vec<ParamSpec>,
    serialized: bool,
}

impl OperationBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: Vec::new(),
            serialized: false,
        }
    }

    /// Declare a required parameter
    pub fn param(mut self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.parameters.push(ParamSpec::required(name, param_type));
        self
    }

    /// Declare an optional parameter with its default
    pub fn param_or(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        default: impl Into<Value>,
    ) -> Self {
        self.parameters
            .push(ParamSpec::optional(name, param_type, default.into()));
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the handler as not safe for concurrent invocation
    pub fn serialized(mut self) -> Self {
        self.serialized = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn build(self) -> Result<OperationDescriptor, RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::EmptyOperationName);
        }

        let mut seen = HashSet::new();
        for spec in &self.parameters {
            if spec.name().is_empty() {
                return Err(RegistryError::EmptyParameterName(self.name.clone()));
            }
            if !seen.insert(spec.name()) {
                return Err(RegistryError::DuplicateParameter {
                    operation: self.name.clone(),
                    parameter: spec.name().to_string(),
                });
            }
            if let Some(default) = spec.default() {
                if !spec.param_type().accepts(default) && !default.is_null() {
                    return Err(RegistryError::InvalidDefault {
                        operation: self.name.clone(),
                        parameter: spec.name().to_string(),
                        expected: spec.param_type().to_string(),
                    });
                }
            }
        }

        Ok(OperationDescriptor {
            href: format!("/api/{}", self.name),
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            serialized: self.serialized,
        })
    }
}

/// Caller-populated collection of operations to expose
#[derive(Default)]
pub struct FunctionRegistry {
    entries: Vec<(OperationBuilder, Arc<dyn Operation>)>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation
    pub fn register<O>(&mut self, operation: OperationBuilder, handler: O) -> &mut Self
    where
        O: Operation + 'static,
    {
        self.entries.push((operation, Arc::new(handler)));
        self
    }

    /// Builder-style variant of [`register`](Self::register)
    pub fn with<O>(mut self, operation: OperationBuilder, handler: O) -> Self
    where
        O: Operation + 'static,
    {
        self.register(operation, handler);
        self
    }

    /// Names of the registered operations, in registration order
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(op, _)| op.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Synthesize every schema and build the routing table.
    ///
    /// Fails on the first invalid or duplicate registration.
    pub fn into_routing_table(self) -> Result<RoutingTable, RegistryError> {
        let mut routes = HashMap::with_capacity(self.entries.len());

        for (builder, handler) in self.entries {
            let descriptor = builder.build()?;
            if routes.contains_key(&descriptor.name) {
                return Err(RegistryError::DuplicateOperation(descriptor.name));
            }
            tracing::debug!(
                operation = %descriptor.name,
                params = descriptor.parameters.len(),
                serialized = descriptor.serialized,
                "Registered operation"
            );
            let gate = descriptor.serialized.then(|| Mutex::new(()));
            routes.insert(
                descriptor.name.clone(),
                Arc::new(Route {
                    descriptor,
                    handler,
                    gate,
                }),
            );
        }

        Ok(RoutingTable { routes })
    }
}

/// One entry of the routing table: descriptor plus bound handler
pub struct Route {
    descriptor: OperationDescriptor,
    handler: Arc<dyn Operation>,
    gate: Option<Mutex<()>>,
}

impl Route {
    pub fn descriptor(&self) -> &OperationDescriptor {
        &self.descriptor
    }

    /// Bind supplied request parameters against the schema.
    ///
    /// Supplied keys win; absent keys take the declared default. Every
    /// missing required parameter is reported in one error.
    pub fn bind(
        &self,
        mut supplied: Map<String, Value>,
        unknown: UnknownParams,
    ) -> GatewayResult<Arguments> {
        let name = &self.descriptor.name;

        let extra: Vec<&String> = supplied
            .keys()
            .filter(|k| self.descriptor.parameter(k).is_none())
            .collect();
        if !extra.is_empty() {
            let listed = extra
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            match unknown {
                UnknownParams::Reject => {
                    return Err(GatewayError::Validation(format!(
                        "unknown parameter(s) for {}: {}",
                        name, listed
                    )));
                }
                UnknownParams::Ignore => {
                    tracing::debug!(operation = %name, ignored = %listed, "Ignoring unknown parameters");
                }
            }
        }

        let mut args = Arguments::new();
        let mut missing = Vec::new();

        for spec in &self.descriptor.parameters {
            match supplied.remove(spec.name()) {
                Some(value) => {
                    if !spec.accepts(&value) {
                        return Err(GatewayError::Validation(format!(
                            "parameter {} of {} must be of type {}",
                            spec.name(),
                            name,
                            spec.param_type()
                        )));
                    }
                    args.insert(spec.name(), spec.param_type().coerce(value));
                }
                None => match spec.default() {
                    Some(default) => args.insert(spec.name(), default.clone()),
                    None => missing.push(spec.name()),
                },
            }
        }

        if !missing.is_empty() {
            return Err(GatewayError::Validation(format!(
                "missing required parameter(s) for {}: {}",
                name,
                missing.join(", ")
            )));
        }

        Ok(args)
    }

    /// Call the handler, waiting for exclusive access if the operation is serialized
    pub async fn invoke(&self, args: Arguments) -> Result<Returned, InvocationError> {
        let _guard = match &self.gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };
        self.handler.invoke(args).await
    }
}

/// Read-only map of operation name to route
pub struct RoutingTable {
    routes: HashMap<String, Arc<Route>>,
}

impl RoutingTable {
    pub fn get(&self, name: &str) -> Option<Arc<Route>> {
        self.routes.get(name).cloned()
    }

    /// Look up an operation, failing with a not-found error
    pub fn resolve(&self, name: &str) -> GatewayResult<Arc<Route>> {
        self.get(name)
            .ok_or_else(|| GatewayError::NotFound(format!("operation not found: {}", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// All descriptors, sorted by name
    pub fn descriptors(&self) -> Vec<&OperationDescriptor> {
        let mut items: Vec<_> = self.routes.values().map(|r| r.descriptor()).collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn echo() -> impl Operation {
        operation_fn(|args: Arguments| async move {
            Ok::<_, InvocationError>(Returned::Json(Value::Object(args.into_map())))
        })
    }

    fn history_op() -> OperationBuilder {
        OperationBuilder::new("download_stock_history_data")
            .param("stock_list", ParamType::Sequence)
            .param("start_time", ParamType::String)
            .param_or("end_time", ParamType::String, "")
            .param_or("period", ParamType::String, "1d")
            .param_or("process_bar", ParamType::Boolean, true)
    }

    fn table() -> RoutingTable {
        FunctionRegistry::new()
            .with(history_op(), echo())
            .with(OperationBuilder::new("ping"), echo())
            .into_routing_table()
            .unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn descriptor_preserves_declaration_order_and_defaults() {
        let table = table();
        let route = table.resolve("download_stock_history_data").unwrap();
        let desc = route.descriptor();

        assert_eq!(
            desc.parameter_names(),
            vec!["stock_list", "start_time", "end_time", "period", "process_bar"]
        );
        assert!(desc.parameters[0].is_required());
        assert_eq!(desc.parameter("period").unwrap().default(), Some(&json!("1d")));
        assert_eq!(desc.parameter("process_bar").unwrap().default(), Some(&json!(true)));
        assert_eq!(desc.href, "/api/download_stock_history_data");
    }

    #[test]
    fn duplicate_operation_rejected() {
        let err = FunctionRegistry::new()
            .with(OperationBuilder::new("ping"), echo())
            .with(OperationBuilder::new("ping"), echo())
            .into_routing_table()
            .err()
            .unwrap();
        assert_eq!(err, RegistryError::DuplicateOperation("ping".into()));
    }

    #[test]
    fn invalid_registrations_rejected() {
        let empty = FunctionRegistry::new()
            .with(OperationBuilder::new(" "), echo())
            .into_routing_table()
            .err();
        assert_eq!(empty, Some(RegistryError::EmptyOperationName));

        let dup_param = FunctionRegistry::new()
            .with(
                OperationBuilder::new("op")
                    .param("a", ParamType::Any)
                    .param("a", ParamType::Any),
                echo(),
            )
            .into_routing_table()
            .err();
        assert!(matches!(dup_param, Some(RegistryError::DuplicateParameter { .. })));

        let bad_default = FunctionRegistry::new()
            .with(
                OperationBuilder::new("op").param_or("count", ParamType::Integer, "ten"),
                echo(),
            )
            .into_routing_table()
            .err();
        assert!(matches!(bad_default, Some(RegistryError::InvalidDefault { .. })));
    }

    #[test]
    fn bind_fills_defaults_for_absent_keys() {
        let table = table();
        let route = table.resolve("download_stock_history_data").unwrap();
        let args = route
            .bind(
                object(json!({"stock_list": ["000001.SZ"], "start_time": "20240101", "period": "1m"})),
                UnknownParams::Ignore,
            )
            .unwrap();

        assert_eq!(
            args.into_map(),
            object(json!({
                "stock_list": ["000001.SZ"],
                "start_time": "20240101",
                "end_time": "",
                "period": "1m",
                "process_bar": true,
            }))
        );
    }

    #[test]
    fn bind_reports_all_missing_required() {
        let table = table();
        let route = table.resolve("download_stock_history_data").unwrap();
        let err = route.bind(Map::new(), UnknownParams::Ignore).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.detail(),
            "missing required parameter(s) for download_stock_history_data: stock_list, start_time"
        );
    }

    #[test]
    fn bind_checks_types() {
        let table = table();
        let route = table.resolve("download_stock_history_data").unwrap();
        let err = route
            .bind(
                object(json!({"stock_list": "000001", "start_time": "20240101"})),
                UnknownParams::Ignore,
            )
            .unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn bind_accepts_integral_floats_for_integers() {
        let table = FunctionRegistry::new()
            .with(
                OperationBuilder::new("bars").param_or("count", ParamType::Integer, -1),
                echo(),
            )
            .into_routing_table()
            .unwrap();
        let route = table.resolve("bars").unwrap();

        let args = route
            .bind(object(json!({"count": 3.0})), UnknownParams::Ignore)
            .unwrap();
        assert_eq!(args.i64("count").unwrap(), 3);

        let err = route
            .bind(object(json!({"count": 3.5})), UnknownParams::Ignore)
            .unwrap_err();
        assert_eq!(err.detail(), "parameter count of bars must be of type integer");
    }

    #[test]
    fn unknown_params_policy() {
        let table = table();
        let route = table.resolve("ping").unwrap();

        let args = route
            .bind(object(json!({"extra": 1})), UnknownParams::Ignore)
            .unwrap();
        assert!(args.is_empty());

        let err = route
            .bind(object(json!({"extra": 1})), UnknownParams::Reject)
            .unwrap_err();
        assert_eq!(err.detail(), "unknown parameter(s) for ping: extra");
    }

    #[test]
    fn resolve_unknown_operation() {
        let err = table().resolve("nope").err().unwrap();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn descriptors_sorted() {
        let table = table();
        let names: Vec<_> = table.descriptors().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["download_stock_history_data", "ping"]);
    }

    #[test]
    fn typed_accessors() {
        let args = Arguments::new()
            .with("s", json!("x"))
            .with("n", json!(3))
            .with("list", json!(["a", "b"]));
        assert_eq!(args.str("s").unwrap(), "x");
        assert_eq!(args.i64("n").unwrap(), 3);
        assert_eq!(args.f64("n").unwrap(), 3.0);
        assert_eq!(args.get::<Vec<String>>("list").unwrap(), vec!["a", "b"]);
        assert_eq!(args.str("n").unwrap_err().message(), "argument n must be a string");
        assert_eq!(args.bool("zzz").unwrap_err().message(), "missing argument: zzz");
    }

    #[tokio::test]
    async fn invoke_calls_handler() {
        let table = FunctionRegistry::new()
            .with(
                OperationBuilder::new("fail").serialized(),
                operation_fn(|_| async { Err::<Returned, _>(InvocationError::new("bad input")) }),
            )
            .into_routing_table()
            .unwrap();
        let route = table.resolve("fail").unwrap();
        let err = route.invoke(Arguments::new()).await.unwrap_err();
        assert_eq!(err.message(), "bad input");
    }
}
