//! stripe_customer

use super::{non_empty, non_empty_list, non_empty_map, update_metadata, StripeResource};
use crate::api::customers::{Address, Customer};
use crate::api::{Client, FormParams};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::StringPattern;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, Schema, SchemaBuilder};

const ADDRESS_KEYS: [&str; 6] = ["line1", "line2", "city", "state", "postal_code", "country"];

#[derive(Default)]
pub struct CustomerResource;

#[async_trait]
impl StripeResource for CustomerResource {
    fn type_name(&self) -> &'static str {
        "stripe_customer"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Customers you charge and track payments for")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unique identifier for the object")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("The customer's full name or business name")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("email", AttributeType::String)
                    .description("Customer's email address, up to 512 characters")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("An arbitrary string shown alongside the customer in the dashboard")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("phone", AttributeType::String)
                    .description("The customer's phone number")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("address", AttributeType::string_map())
                    .description("Address fields: line1, line2, city, state, postal_code and country")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("shipping", AttributeType::string_map())
                    .description("Shipping name, phone and the address fields")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("balance", AttributeType::Number)
                    .description(
                        "Balance in cents applied to future invoices; negative values are a credit",
                    )
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("default_invoice_prefix", AttributeType::String)
                    .description("The prefix Stripe generated for invoice numbers")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("invoice_prefix", AttributeType::String)
                    .description("Prefix for invoice numbers, 3 to 12 uppercase letters or digits")
                    .optional()
                    .validator(StringPattern::new(
                        "^[A-Z0-9]{3,12}$",
                        "3 to 12 uppercase letters or digits",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("invoice_settings", AttributeType::string_map())
                    .description(
                        "Invoice defaults: footer, default_payment_method, and any other key as a custom field",
                    )
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("next_invoice_sequence", AttributeType::Number)
                    .description("The sequence to be used on the customer's next invoice")
                    .default(StaticDefault::number(1.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("preferred_locales", AttributeType::string_list())
                    .description("Customer's preferred languages, ordered by preference")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("metadata", AttributeType::string_map())
                    .description("Set of key-value pairs attached to the object")
                    .optional()
                    .build(),
            )
            .build()
    }

    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new()
            .add_optional("name", d.optional_string("name"))
            .add_optional("email", d.optional_string("email"))
            .add_optional("description", d.optional_string("description"))
            .add_optional("phone", d.optional_string("phone"))
            .add_optional("invoice_prefix", d.optional_string("invoice_prefix"));
        if d.get_ok("address").is_some() {
            params = params.nested("address", address_params(&d.extract_string_map("address")));
        }
        if d.get_ok("shipping").is_some() {
            params = params.nested("shipping", shipping_params(&d.extract_string_map("shipping")));
        }
        if d.get_ok("balance").is_some() {
            params = params.add("balance", d.extract_int64("balance"));
        }
        if d.get_ok("invoice_settings").is_some() {
            params = params.nested(
                "invoice_settings",
                invoice_settings_params(&d.extract_string_map("invoice_settings")),
            );
        }
        if d.get_ok("next_invoice_sequence").is_some() {
            params = params.add("next_invoice_sequence", d.extract_int64("next_invoice_sequence"));
        }
        if d.get_ok("preferred_locales").is_some() {
            params = params.add_list("preferred_locales", &d.extract_string_list("preferred_locales"));
        }
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.customers().create(ctx, &params).await {
            Ok(customer) => d.set_id(&customer.id),
            Err(e) => return vec![api_error("create customer", e)],
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let customer = match client.customers().get(ctx, &d.id()).await {
            Ok(customer) if customer.deleted => {
                return vec![Diagnostic::error(
                    "Failed to read customer",
                    format!("customer {} has been deleted", customer.id),
                )]
            }
            Ok(customer) => customer,
            Err(e) => return vec![api_error("read customer", e)],
        };

        // the generated prefix lands in default_invoice_prefix unless one was configured
        let invoice_prefix = if d.get_ok("invoice_prefix").is_some() {
            non_empty(customer.invoice_prefix.clone())
        } else {
            None
        };

        call_set([
            d.set("name", non_empty(customer.name.clone())),
            d.set("email", non_empty(customer.email.clone())),
            d.set("description", non_empty(customer.description.clone())),
            d.set("phone", non_empty(customer.phone.clone())),
            d.set("address", non_empty_map(flatten_address(customer.address.as_ref()))),
            d.set("shipping", flatten_shipping(&customer)),
            d.set("balance", customer.balance),
            d.set("invoice_prefix", invoice_prefix),
            d.set("default_invoice_prefix", non_empty(customer.invoice_prefix.clone())),
            d.set("invoice_settings", flatten_invoice_settings(&customer)),
            d.set("next_invoice_sequence", customer.next_invoice_sequence),
            d.set("preferred_locales", non_empty_list(customer.preferred_locales)),
            d.set("metadata", non_empty_map(customer.metadata)),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        for name in ["name", "email", "description", "phone", "invoice_prefix"] {
            if d.has_change(name) {
                params = params.add(name, d.extract_string(name));
            }
        }
        for name in ["balance", "next_invoice_sequence"] {
            if d.has_change(name) {
                params = params.add(name, d.extract_int64(name));
            }
        }

        // an emptied block is sent as "" which unsets it
        if d.has_change("address") {
            let address = d.extract_string_map("address");
            params = if address.is_empty() {
                params.add("address", "")
            } else {
                params.nested("address", address_params(&address))
            };
        }
        if d.has_change("shipping") {
            let shipping = d.extract_string_map("shipping");
            params = if shipping.is_empty() {
                params.add("shipping", "")
            } else {
                params.nested("shipping", shipping_params(&shipping))
            };
        }
        if d.has_change("invoice_settings") {
            params = params.nested(
                "invoice_settings",
                invoice_settings_params(&d.extract_string_map("invoice_settings")),
            );
        }
        if d.has_change("preferred_locales") {
            params = params.add_list("preferred_locales", &d.extract_string_list("preferred_locales"));
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.customers().update(ctx, &d.id(), &params).await {
                return vec![api_error("update customer", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        if let Err(e) = client.customers().delete(ctx, &d.id()).await {
            return vec![api_error("delete customer", e)];
        }
        d.set_id("");
        vec![]
    }
}

/// Known address keys only; anything else in the map is ignored
fn address_params(fields: &HashMap<String, String>) -> FormParams {
    ADDRESS_KEYS.iter().fold(FormParams::new(), |params, key| {
        params.add_optional(*key, fields.get(*key))
    })
}

fn shipping_params(fields: &HashMap<String, String>) -> FormParams {
    FormParams::new()
        .add_optional("name", fields.get("name"))
        .add_optional("phone", fields.get("phone"))
        .nested("address", address_params(fields))
}

/// `footer` and `default_payment_method` map to their fields; every other
/// key becomes a custom field, in key order
fn invoice_settings_params(settings: &HashMap<String, String>) -> FormParams {
    let sorted: BTreeMap<_, _> = settings.iter().collect();
    let mut params = FormParams::new();
    let mut custom = 0;
    for (key, value) in sorted {
        match key.as_str() {
            "footer" | "default_payment_method" => params = params.add(key.as_str(), value),
            _ => {
                params = params
                    .add(format!("custom_fields[{}][name]", custom), key)
                    .add(format!("custom_fields[{}][value]", custom), value);
                custom += 1;
            }
        }
    }
    params
}

fn flatten_address(address: Option<&Address>) -> HashMap<String, String> {
    address
        .map(|a| {
            a.fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn flatten_shipping(customer: &Customer) -> Option<HashMap<String, String>> {
    let shipping = customer.shipping.as_ref()?;
    let mut fields = flatten_address(shipping.address.as_ref());
    if let Some(name) = non_empty(shipping.name.clone()) {
        fields.insert("name".to_string(), name);
    }
    if let Some(phone) = non_empty(shipping.phone.clone()) {
        fields.insert("phone".to_string(), phone);
    }
    non_empty_map(fields)
}

fn flatten_invoice_settings(customer: &Customer) -> Option<HashMap<String, String>> {
    let settings = customer.invoice_settings.as_ref()?;
    let mut fields = HashMap::new();
    if let Some(footer) = non_empty(settings.footer.clone()) {
        fields.insert("footer".to_string(), footer);
    }
    if let Some(pm) = &settings.default_payment_method {
        fields.insert("default_payment_method".to_string(), pm.clone());
    }
    for field in settings.custom_fields.iter().flatten() {
        fields.insert(field.name.clone(), field.value.clone());
    }
    non_empty_map(fields)
}
