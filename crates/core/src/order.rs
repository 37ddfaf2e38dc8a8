//! Shipping form validation and the immutable order record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, LineItem};
use crate::pricing::PricingSummary;
use crate::types::{Email, EmailError, OrderId, OrderStatus, PaymentMethod};

const MIN_NAME_LEN: usize = 2;
const MIN_CITY_LEN: usize = 2;
const MIN_ADDRESS_LEN: usize = 5;
const MIN_PHONE_DIGITS: usize = 10;
const POSTAL_CODE_LEN: std::ops::RangeInclusive<usize> = 2..=10;

/// Which name field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePart {
    First,
    Last,
}

impl NamePart {
    const fn lower(self) -> &'static str {
        match self {
            Self::First => "first name",
            Self::Last => "last name",
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::First => "First name",
            Self::Last => "Last name",
        }
    }
}

/// A single failing checkout field. Validation stops at the first failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your {}", .0.lower())]
    NameMissing(NamePart),

    #[error("{} must be at least 2 characters long", .0.title())]
    NameTooShort(NamePart),

    #[error("{} can only contain letters, spaces, hyphens, and apostrophes", .0.title())]
    NameInvalid(NamePart),

    #[error("Please enter your phone number")]
    PhoneMissing,

    #[error("Please enter a valid phone number")]
    PhoneInvalid,

    #[error("Phone number must have at least 10 digits")]
    PhoneTooShort,

    #[error("Please enter your email address")]
    EmailMissing,

    #[error("Please enter a valid email address")]
    EmailInvalid(#[source] EmailError),

    #[error("Please select your country/region")]
    CountryMissing,

    #[error("Please enter your city")]
    CityMissing,

    #[error("City name must be at least 2 characters long")]
    CityTooShort,

    #[error("Please enter your address")]
    AddressMissing,

    #[error("Address must be at least 5 characters long")]
    AddressTooShort,

    #[error("Please enter a valid postal code")]
    PostalCodeInvalid,

    #[error("Please agree with our Terms and Policies to proceed")]
    TermsNotAccepted,
}

impl ValidationError {
    /// Form field the error belongs to, for placing the message inline.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::NameMissing(NamePart::First)
            | Self::NameTooShort(NamePart::First)
            | Self::NameInvalid(NamePart::First) => "firstName",
            Self::NameMissing(NamePart::Last)
            | Self::NameTooShort(NamePart::Last)
            | Self::NameInvalid(NamePart::Last) => "lastName",
            Self::PhoneMissing | Self::PhoneInvalid | Self::PhoneTooShort => "phone",
            Self::EmailMissing | Self::EmailInvalid(_) => "email",
            Self::CountryMissing => "country",
            Self::CityMissing | Self::CityTooShort => "city",
            Self::AddressMissing | Self::AddressTooShort => "address",
            Self::PostalCodeInvalid => "postalCode",
            Self::TermsNotAccepted => "acceptTerms",
        }
    }
}

/// Raw checkout form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub country: String,
    pub city: String,
    pub address: String,
    pub apartment: String,
    pub postal_code: String,
    pub accept_terms: bool,
}

impl ShippingForm {
    /// Validate every field in form order, returning the first failure.
    ///
    /// All text fields are trimmed before checking. On success the trimmed
    /// values are returned as a [`Customer`] and an [`Address`].
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] of the first failing field.
    pub fn validate(&self) -> Result<(Customer, Address), ValidationError> {
        let first_name = validate_name(&self.first_name, NamePart::First)?;
        let last_name = validate_name(&self.last_name, NamePart::Last)?;
        let phone = validate_phone(&self.phone)?;
        let email = validate_email(&self.email)?;

        let country = self.country.trim();
        if country.is_empty() {
            return Err(ValidationError::CountryMissing);
        }

        let city = self.city.trim();
        if city.is_empty() {
            return Err(ValidationError::CityMissing);
        }
        if city.chars().count() < MIN_CITY_LEN {
            return Err(ValidationError::CityTooShort);
        }

        let address = self.address.trim();
        if address.is_empty() {
            return Err(ValidationError::AddressMissing);
        }
        if address.chars().count() < MIN_ADDRESS_LEN {
            return Err(ValidationError::AddressTooShort);
        }

        let postal_code = non_empty(&self.postal_code);
        if let Some(code) = postal_code.as_deref() {
            let valid_chars = code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-');
            if !valid_chars || !POSTAL_CODE_LEN.contains(&code.chars().count()) {
                return Err(ValidationError::PostalCodeInvalid);
            }
        }

        if !self.accept_terms {
            return Err(ValidationError::TermsNotAccepted);
        }

        Ok((
            Customer {
                first_name,
                last_name,
                email,
                phone,
            },
            Address {
                address: address.to_owned(),
                apartment: non_empty(&self.apartment),
                city: city.to_owned(),
                postal_code,
                country: country.to_owned(),
            },
        ))
    }
}

fn validate_name(raw: &str, part: NamePart) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::NameMissing(part));
    }
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::NameTooShort(part));
    }
    let allowed = |c: char| c.is_ascii_alphabetic() || c.is_whitespace() || c == '\'' || c == '-';
    if !name.chars().all(allowed) {
        return Err(ValidationError::NameInvalid(part));
    }
    Ok(name.to_owned())
}

fn validate_phone(raw: &str) -> Result<String, ValidationError> {
    let phone = raw.trim();
    if phone.is_empty() {
        return Err(ValidationError::PhoneMissing);
    }
    let allowed = |c: char| c.is_ascii_digit() || c.is_whitespace() || "+-()".contains(c);
    if !phone.chars().all(allowed) {
        return Err(ValidationError::PhoneInvalid);
    }
    if phone.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
        return Err(ValidationError::PhoneTooShort);
    }
    Ok(phone.to_owned())
}

fn validate_email(raw: &str) -> Result<Email, ValidationError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ValidationError::EmailMissing);
    }
    Email::parse(email).map_err(ValidationError::EmailInvalid)
}

fn non_empty(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
}

impl Customer {
    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Where the order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub country: String,
}

impl Address {
    /// Street line with the apartment appended when present.
    #[must_use]
    pub fn street_line(&self) -> String {
        match &self.apartment {
            Some(apartment) => format!("{}, {apartment}", self.address),
            None => self.address.clone(),
        }
    }

    /// "City, Postal" or just "City".
    #[must_use]
    pub fn city_line(&self) -> String {
        match &self.postal_code {
            Some(postal_code) => format!("{}, {postal_code}", self.city),
            None => self.city.clone(),
        }
    }
}

/// Reasons an incoming order payload cannot be acted on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderPayloadError {
    #[error("order has no items")]
    NoItems,

    #[error("customer first name is missing")]
    MissingFirstName,

    #[error("customer email is invalid: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("order totals do not add up")]
    InconsistentTotals,
}

/// An immutable record of a completed checkout.
///
/// Fields are private; an order can only be assembled by [`Order::build`] or
/// deserialized from its wire form, and is read through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    order_id: OrderId,
    customer: Customer,
    address: Address,
    items: Vec<LineItem>,
    subtotal: Decimal,
    discount: Decimal,
    shipping: Decimal,
    total: Decimal,
    #[serde(default)]
    payment_method: PaymentMethod,
    order_date: DateTime<Utc>,
    #[serde(default)]
    status: OrderStatus,
}

impl Order {
    /// Assemble an order from a cart snapshot and its pricing.
    ///
    /// The caller is responsible for having validated the customer and
    /// address and for pricing exactly this cart.
    #[must_use]
    pub fn build(
        order_id: OrderId,
        customer: Customer,
        address: Address,
        cart: &Cart,
        pricing: &PricingSummary,
        order_date: DateTime<Utc>,
    ) -> Self {
        Self {
            order_id,
            customer,
            address,
            items: cart.items().to_vec(),
            subtotal: pricing.subtotal,
            discount: pricing.discount_amount,
            shipping: pricing.shipping_fee,
            total: pricing.total,
            payment_method: PaymentMethod::CashOnDelivery,
            order_date,
            status: OrderStatus::Pending,
        }
    }

    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    #[must_use]
    pub const fn customer(&self) -> &Customer {
        &self.customer
    }

    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    #[must_use]
    pub const fn discount(&self) -> Decimal {
        self.discount
    }

    #[must_use]
    pub const fn shipping(&self) -> Decimal {
        self.shipping
    }

    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    #[must_use]
    pub const fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    #[must_use]
    pub const fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Check that a received order carries what the notification emails need.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: no items, a blank first name, an
    /// invalid customer email, or amounts that go negative, break
    /// `total == subtotal - discount + shipping`, or are too large to add up
    /// (including any single line total).
    pub fn ensure_notifiable(&self) -> Result<(), OrderPayloadError> {
        if self.items.is_empty() {
            return Err(OrderPayloadError::NoItems);
        }
        if self.customer.first_name.trim().is_empty() {
            return Err(OrderPayloadError::MissingFirstName);
        }
        Email::parse(self.customer.email.as_str())?;

        let amounts = [self.subtotal, self.discount, self.shipping, self.total];
        if amounts.iter().any(|amount| *amount < Decimal::ZERO)
            || self.items.iter().any(|item| item.line_total().is_none())
        {
            return Err(OrderPayloadError::InconsistentTotals);
        }

        let expected = self
            .subtotal
            .checked_sub(self.discount)
            .and_then(|rest| rest.checked_add(self.shipping));
        if expected != Some(self.total) {
            return Err(OrderPayloadError::InconsistentTotals);
        }
        Ok(())
    }
}

/// Response body of the order email endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEmailResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

impl OrderEmailResponse {
    /// Successful delivery of both emails.
    #[must_use]
    pub fn sent(order_id: OrderId) -> Self {
        Self {
            success: true,
            message: "Order confirmation emails sent successfully!".to_string(),
            order_id: Some(order_id),
        }
    }

    /// A failure with a client-facing message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            order_id: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::pricing::summarize;

    fn valid_form() -> ShippingForm {
        ShippingForm {
            first_name: "Ayesha".to_string(),
            last_name: "Khan".to_string(),
            phone: "+92 300 1234567".to_string(),
            email: "ayesha@example.com".to_string(),
            country: "Pakistan".to_string(),
            city: "Lahore".to_string(),
            address: "12 Main Boulevard".to_string(),
            apartment: String::new(),
            postal_code: "54000".to_string(),
            accept_terms: true,
        }
    }

    #[test]
    fn test_valid_form_trims_and_splits() {
        let mut form = valid_form();
        form.first_name = "  Ayesha ".to_string();
        form.apartment = " Flat 3 ".to_string();

        let (customer, address) = form.validate().unwrap();
        assert_eq!(customer.first_name, "Ayesha");
        assert_eq!(customer.email.as_str(), "ayesha@example.com");
        assert_eq!(address.apartment.as_deref(), Some("Flat 3"));
        assert_eq!(address.street_line(), "12 Main Boulevard, Flat 3");
        assert_eq!(address.city_line(), "Lahore, 54000");
    }

    #[test]
    fn test_first_failing_field_wins() {
        let mut form = valid_form();
        form.first_name = String::new();
        form.email = "broken".to_string();
        form.accept_terms = false;

        let err = form.validate().unwrap_err();
        assert_eq!(err, ValidationError::NameMissing(NamePart::First));
        assert_eq!(err.field(), "firstName");
        assert_eq!(err.to_string(), "Please enter your first name");
    }

    #[test]
    fn test_name_rules() {
        let mut form = valid_form();
        form.last_name = "K".to_string();
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Last name must be at least 2 characters long"
        );

        form.last_name = "Kh4n".to_string();
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::NameInvalid(NamePart::Last)
        );

        form.last_name = "O'Neil-Smith".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_phone_rules() {
        let mut form = valid_form();
        form.phone = "0300-CALL-ME".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::PhoneInvalid);

        form.phone = "(0300) 123".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::PhoneTooShort);

        form.phone = "(0300) 1234567".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_email_rules() {
        let mut form = valid_form();
        form.email = "  ".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::EmailMissing);

        form.email = "ayesha@example".to_string();
        assert!(matches!(
            form.validate().unwrap_err(),
            ValidationError::EmailInvalid(_)
        ));
    }

    #[test]
    fn test_location_rules() {
        let mut form = valid_form();
        form.country = String::new();
        assert_eq!(form.validate().unwrap_err(), ValidationError::CountryMissing);

        let mut form = valid_form();
        form.city = "L".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::CityTooShort);

        let mut form = valid_form();
        form.address = "12 B".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::AddressTooShort);
    }

    #[test]
    fn test_postal_code_is_optional_but_checked() {
        let mut form = valid_form();
        form.postal_code = String::new();
        let (_, address) = form.validate().unwrap();
        assert_eq!(address.postal_code, None);
        assert_eq!(address.city_line(), "Lahore");

        form.postal_code = "5".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::PostalCodeInvalid);

        form.postal_code = "54000#".to_string();
        assert_eq!(form.validate().unwrap_err(), ValidationError::PostalCodeInvalid);

        form.postal_code = "SW1A 1AA".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_terms_must_be_accepted() {
        let mut form = valid_form();
        form.accept_terms = false;
        assert_eq!(form.validate().unwrap_err(), ValidationError::TermsNotAccepted);
    }

    fn sample_order() -> Order {
        let (customer, address) = valid_form().validate().unwrap();
        let mut cart = Cart::new();
        cart.add(
            LineItem::new("p1", "Velvet Lipstick", Decimal::from(1000), "p1.jpg"),
            2,
        );
        let pricing = summarize(&cart, None);
        Order::build(
            OrderId::new("ORD-1-ABCDEFGHI"),
            customer,
            address,
            &cart,
            &pricing,
            Utc.with_ymd_and_hms(2025, 3, 14, 10, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_build_copies_cart_and_pricing() {
        let order = sample_order();
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.subtotal(), Decimal::from(2000));
        assert_eq!(order.shipping(), Decimal::from(250));
        assert_eq!(order.total(), Decimal::from(2250));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_method(), PaymentMethod::CashOnDelivery);
        assert!(order.ensure_notifiable().is_ok());
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(sample_order()).unwrap();
        assert_eq!(json["orderId"], "ORD-1-ABCDEFGHI");
        assert_eq!(json["customer"]["firstName"], "Ayesha");
        assert_eq!(json["address"]["postalCode"], "54000");
        assert!(json["address"].get("apartment").is_none());
        assert_eq!(json["paymentMethod"], "cash_on_delivery");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["orderDate"], "2025-03-14T10:30:00Z");
    }

    #[test]
    fn test_ensure_notifiable_rejects_bad_payloads() {
        let mut json = serde_json::to_value(sample_order()).unwrap();
        json["items"] = serde_json::json!([]);
        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.ensure_notifiable(), Err(OrderPayloadError::NoItems));

        let mut json = serde_json::to_value(sample_order()).unwrap();
        json["customer"]["email"] = serde_json::json!("not-an-email");
        let order: Order = serde_json::from_value(json).unwrap();
        assert!(matches!(
            order.ensure_notifiable(),
            Err(OrderPayloadError::InvalidEmail(_))
        ));

        let mut json = serde_json::to_value(sample_order()).unwrap();
        json["total"] = serde_json::json!(1);
        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(
            order.ensure_notifiable(),
            Err(OrderPayloadError::InconsistentTotals)
        );
    }

    #[test]
    fn test_ensure_notifiable_rejects_amounts_too_large_to_add() {
        let max = Decimal::MAX.to_string();

        let mut json = serde_json::to_value(sample_order()).unwrap();
        json["subtotal"] = serde_json::json!(max);
        json["discount"] = serde_json::json!("0");
        json["shipping"] = serde_json::json!("1");
        json["total"] = serde_json::json!(max);
        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(
            order.ensure_notifiable(),
            Err(OrderPayloadError::InconsistentTotals)
        );

        let mut json = serde_json::to_value(sample_order()).unwrap();
        json["items"][0]["price"] = serde_json::json!(max);
        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(
            order.ensure_notifiable(),
            Err(OrderPayloadError::InconsistentTotals)
        );
    }

    #[test]
    fn test_response_shapes() {
        let sent = serde_json::to_value(OrderEmailResponse::sent(OrderId::new("ORD-1-X"))).unwrap();
        assert_eq!(sent["success"], true);
        assert_eq!(sent["orderId"], "ORD-1-X");

        let failed = serde_json::to_value(OrderEmailResponse::failure("nope")).unwrap();
        assert_eq!(failed["success"], false);
        assert!(failed.get("orderId").is_none());
    }
}
