//! Schema collaborators and their per-view bindings.
//!
//! A schema has two sides:
//!
//! - [`Schema::load`] validates an inbound payload (request body, query string),
//! - [`Dump::dump`] serializes domain objects for the response.
//!
//! Views bind schema *factories* ([`SchemaClass`], [`ResponseSchemaClass`],
//! [`ModelSchemaClass`]); an instance is built from the factory for every use.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use viewkit_core::{Method, Request, ValidationError, ViewError, ViewResult};

/// Options handed to a schema factory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaOptions {
    /// Collection mode: payloads/bodies are sequences of objects.
    pub many: bool,
    /// Free-form context for custom schemas.
    pub context: JsonMap<String, JsonValue>,
}

impl SchemaOptions {
    pub fn many() -> Self {
        Self {
            many: true,
            ..Self::default()
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// Inbound side of a schema.
pub trait Schema: Send + Sync {
    fn load(&self, data: JsonValue) -> Result<JsonValue, ValidationError>;
}

/// Outbound side of a schema.
pub trait Dump<T>: Send + Sync {
    fn dump(&self, obj: &T) -> ViewResult<JsonValue>;

    fn dump_many(&self, objs: &[T]) -> ViewResult<JsonValue> {
        objs.iter()
            .map(|obj| self.dump(obj))
            .collect::<ViewResult<Vec<_>>>()
            .map(JsonValue::Array)
    }
}

/// Schema backed by a serde type.
///
/// `load` deserializes into `T` (or `Vec<T>` in many mode) and serializes the
/// result back, so unknown shapes are rejected and defaults are applied.
/// `dump` is plain serialization.
pub struct SerdeSchema<T> {
    options: SchemaOptions,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeSchema<T> {
    pub fn new(options: &SchemaOptions) -> Self {
        Self {
            options: options.clone(),
            _marker: PhantomData,
        }
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }
}

impl<T: Serialize + DeserializeOwned> Schema for SerdeSchema<T> {
    fn load(&self, data: JsonValue) -> Result<JsonValue, ValidationError> {
        if self.options.many {
            let items: Vec<T> = serde_json::from_value(data)?;
            Ok(serde_json::to_value(items)?)
        } else {
            let item: T = serde_json::from_value(data)?;
            Ok(serde_json::to_value(item)?)
        }
    }
}

impl<T: Serialize> Dump<T> for SerdeSchema<T> {
    fn dump(&self, obj: &T) -> ViewResult<JsonValue> {
        serde_json::to_value(obj).map_err(|e| ViewError::encoding(e.to_string()))
    }
}

type LoadFactory = Arc<dyn Fn(&SchemaOptions) -> Box<dyn Schema> + Send + Sync>;
type DumpFactory<T> = Arc<dyn Fn(&SchemaOptions) -> Box<dyn Dump<T>> + Send + Sync>;

/// Factory for inbound schemas (request bodies, filters).
#[derive(Clone)]
pub struct SchemaClass {
    name: &'static str,
    factory: LoadFactory,
}

impl SchemaClass {
    pub fn new<F, S>(name: &'static str, factory: F) -> Self
    where
        F: Fn(&SchemaOptions) -> S + Send + Sync + 'static,
        S: Schema + 'static,
    {
        Self {
            name,
            factory: Arc::new(move |options: &SchemaOptions| -> Box<dyn Schema> {
                Box::new(factory(options))
            }),
        }
    }

    pub fn serde<T: Serialize + DeserializeOwned + 'static>() -> Self {
        Self::new(std::any::type_name::<T>(), SerdeSchema::<T>::new)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instantiate(&self, options: &SchemaOptions) -> Box<dyn Schema> {
        (self.factory)(options)
    }
}

impl core::fmt::Debug for SchemaClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("SchemaClass").field(&self.name).finish()
    }
}

/// Factory for response serializers of `T`.
pub struct ResponseSchemaClass<T> {
    name: &'static str,
    factory: DumpFactory<T>,
}

impl<T: 'static> ResponseSchemaClass<T> {
    pub fn new<F, S>(name: &'static str, factory: F) -> Self
    where
        F: Fn(&SchemaOptions) -> S + Send + Sync + 'static,
        S: Dump<T> + 'static,
    {
        Self {
            name,
            factory: Arc::new(move |options: &SchemaOptions| -> Box<dyn Dump<T>> {
                Box::new(factory(options))
            }),
        }
    }

    pub fn serde() -> Self
    where
        T: Serialize,
    {
        Self::new(std::any::type_name::<T>(), SerdeSchema::<T>::new)
    }
}

impl<T> ResponseSchemaClass<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instantiate(&self, options: &SchemaOptions) -> Box<dyn Dump<T>> {
        (self.factory)(options)
    }
}

impl<T> Clone for ResponseSchemaClass<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            factory: self.factory.clone(),
        }
    }
}

impl<T> core::fmt::Debug for ResponseSchemaClass<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("ResponseSchemaClass").field(&self.name).finish()
    }
}

/// One schema used for both directions (the view's generic binding).
pub struct ModelSchemaClass<T> {
    request: SchemaClass,
    response: ResponseSchemaClass<T>,
}

impl<T: 'static> ModelSchemaClass<T> {
    pub fn new<F, S>(name: &'static str, factory: F) -> Self
    where
        F: Fn(&SchemaOptions) -> S + Send + Sync + 'static,
        S: Schema + Dump<T> + 'static,
    {
        let factory = Arc::new(factory);
        let load = factory.clone();
        Self {
            request: SchemaClass::new(name, move |options: &SchemaOptions| load(options)),
            response: ResponseSchemaClass::new(name, move |options: &SchemaOptions| {
                factory(options)
            }),
        }
    }

    pub fn serde() -> Self
    where
        T: Serialize + DeserializeOwned,
    {
        Self::new(std::any::type_name::<T>(), SerdeSchema::<T>::new)
    }
}

impl<T> Clone for ModelSchemaClass<T> {
    fn clone(&self) -> Self {
        Self {
            request: self.request.clone(),
            response: self.response.clone(),
        }
    }
}

/// Computes response schema options for a request.
pub type OptionsHook = Arc<dyn Fn(&Request) -> SchemaOptions + Send + Sync>;

/// Inbound schema plus the options it is built with.
#[derive(Debug, Clone)]
pub struct SchemaBinding {
    pub class: SchemaClass,
    pub options: Option<SchemaOptions>,
}

impl From<SchemaClass> for SchemaBinding {
    fn from(class: SchemaClass) -> Self {
        Self {
            class,
            options: None,
        }
    }
}

/// Every schema binding of a view.
///
/// Inbound resolution: method binding → request binding → generic binding →
/// configuration error. Outbound: response binding → generic binding → none.
pub struct SchemaBindings<T> {
    generic: Option<ModelSchemaClass<T>>,
    request: Option<SchemaBinding>,
    methods: HashMap<Method, SchemaBinding>,
    request_options: SchemaOptions,
    response: Option<ResponseSchemaClass<T>>,
    response_options: OptionsHook,
    filter: Option<SchemaBinding>,
}

impl<T> Default for SchemaBindings<T> {
    fn default() -> Self {
        Self {
            generic: None,
            request: None,
            methods: HashMap::new(),
            request_options: SchemaOptions::default(),
            response: None,
            response_options: Arc::new(|_| SchemaOptions::default()),
            filter: None,
        }
    }
}

impl<T> Clone for SchemaBindings<T> {
    fn clone(&self) -> Self {
        Self {
            generic: self.generic.clone(),
            request: self.request.clone(),
            methods: self.methods.clone(),
            request_options: self.request_options.clone(),
            response: self.response.clone(),
            response_options: self.response_options.clone(),
            filter: self.filter.clone(),
        }
    }
}

impl<T> SchemaBindings<T> {
    pub fn set_generic(&mut self, class: ModelSchemaClass<T>) {
        self.generic = Some(class);
    }

    pub fn set_request(&mut self, binding: SchemaBinding) {
        self.request = Some(binding);
    }

    pub fn set_method(&mut self, method: Method, binding: SchemaBinding) {
        self.methods.insert(method, binding);
    }

    pub fn set_request_options(&mut self, options: SchemaOptions) {
        self.request_options = options;
    }

    pub fn set_response(&mut self, class: ResponseSchemaClass<T>) {
        self.response = Some(class);
    }

    pub fn set_response_options(&mut self, hook: OptionsHook) {
        self.response_options = hook;
    }

    pub fn set_filter(&mut self, binding: SchemaBinding) {
        self.filter = Some(binding);
    }

    /// Schema used to validate the request body.
    pub fn request_schema(&self, request: &Request) -> ViewResult<Box<dyn Schema>> {
        let binding = self
            .methods
            .get(request.method())
            .or(self.request.as_ref());

        if let Some(binding) = binding {
            let options = binding.options.as_ref().unwrap_or(&self.request_options);
            return Ok(binding.class.instantiate(options));
        }

        match &self.generic {
            Some(generic) => Ok(generic.request.instantiate(&self.request_options)),
            None => Err(ViewError::configuration(
                "no request schema defined for the view",
            )),
        }
    }

    pub fn filter_schema(&self) -> ViewResult<Box<dyn Schema>> {
        let binding = self
            .filter
            .as_ref()
            .ok_or_else(|| ViewError::configuration("no filter schema defined for the view"))?;
        let options = binding.options.clone().unwrap_or_default();
        Ok(binding.class.instantiate(&options))
    }

    pub fn response_class(&self) -> Option<ResponseSchemaClass<T>> {
        self.response
            .clone()
            .or_else(|| self.generic.as_ref().map(|g| g.response.clone()))
    }

    pub fn response_options(&self) -> OptionsHook {
        self.response_options.clone()
    }
}
