//! Diameter AVP dictionary.
//!
//! Parses one or more embedded XML definitions (base protocol + 3GPP S6a/S6d)
//! into a single lookup table keyed by `(vendor_id, code)`, with a reverse
//! `name -> (vendor_id, code)` index so handlers can look AVPs up
//! polymorphically by name instead of hard-coding numeric codes everywhere.

use lazy_static::lazy_static;
use serde::Deserialize;
use serde_xml_rs::from_str;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvpTypeDef {
    UTF8String,
    OctetString,
    Integer32,
    Integer64,
    Unsigned32,
    Unsigned64,
    Enumerated,
    Grouped,
    Identity,
    DiameterURI,
    Time,
    AddressIPv4,
    AddressIPv6,
    Float32,
    Float64,
}

#[derive(Debug, Clone)]
struct AvpDefinition {
    name: String,
    vendor_id: u32,
    code: u32,
    avp_type: AvpTypeDef,
}

#[derive(Debug, Clone)]
pub struct Dictionary {
    by_code: HashMap<(u32, u32), AvpDefinition>,
    by_name: HashMap<String, (u32, u32)>,
}

impl Dictionary {
    /// Parses and merges every XML fragment given, in order. A later
    /// fragment redefining an already-known `(vendor_id, code)` overwrites
    /// the earlier definition, which lets a deployment-specific dictionary
    /// fragment be layered on top of the embedded defaults.
    pub fn new(xmls: &[&str]) -> Dictionary {
        let mut dict = Dictionary {
            by_code: HashMap::new(),
            by_name: HashMap::new(),
        };
        for xml in xmls {
            dict.merge(xml);
        }
        dict
    }

    fn merge(&mut self, xml: &str) {
        let parsed: DiameterXml = from_str(xml).unwrap();
        for application in &parsed.application {
            for avp in &application.avps {
                let vendor_id = avp
                    .vendor_id
                    .as_deref()
                    .map(|v| v.parse::<u32>().unwrap())
                    .unwrap_or(0);
                let code = avp.code.parse::<u32>().unwrap();
                let avp_type = match avp.data.data_type.as_str() {
                    "UTF8String" => AvpTypeDef::UTF8String,
                    "OctetString" => AvpTypeDef::OctetString,
                    "Integer32" => AvpTypeDef::Integer32,
                    "Integer64" => AvpTypeDef::Integer64,
                    "Unsigned32" => AvpTypeDef::Unsigned32,
                    "Unsigned64" => AvpTypeDef::Unsigned64,
                    "Enumerated" => AvpTypeDef::Enumerated,
                    "Grouped" => AvpTypeDef::Grouped,
                    "DiameterIdentity" => AvpTypeDef::Identity,
                    "DiameterURI" => AvpTypeDef::DiameterURI,
                    "Time" => AvpTypeDef::Time,
                    "IPv4" => AvpTypeDef::AddressIPv4,
                    "IPv6" => AvpTypeDef::AddressIPv6,
                    "Float32" => AvpTypeDef::Float32,
                    "Float64" => AvpTypeDef::Float64,
                    other => panic!("unknown avp data type in dictionary: {other}"),
                };

                let definition = AvpDefinition {
                    name: avp.name.clone(),
                    vendor_id,
                    code,
                    avp_type,
                };
                self.by_name.insert(avp.name.clone(), (vendor_id, code));
                self.by_code.insert((vendor_id, code), definition);
            }
        }
    }

    pub fn get_avp_type(&self, vendor_id: u32, code: u32) -> Option<AvpTypeDef> {
        self.by_code.get(&(vendor_id, code)).map(|d| d.avp_type)
    }

    pub fn get_avp_name(&self, vendor_id: u32, code: u32) -> Option<&str> {
        self.by_code.get(&(vendor_id, code)).map(|d| d.name.as_str())
    }

    /// Reverse lookup: resolve an AVP's wire identity from its dictionary name.
    pub fn get_avp_code(&self, name: &str) -> Option<(u32, u32)> {
        self.by_name.get(name).copied()
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct DiameterXml {
    #[serde(rename = "application", default)]
    application: Vec<ApplicationXml>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ApplicationXml {
    #[serde(rename = "avp", default)]
    avps: Vec<AvpXml>,
}

#[derive(Debug, Deserialize, PartialEq)]
struct AvpXml {
    name: String,
    code: String,
    #[serde(rename = "vendor-id")]
    vendor_id: Option<String>,
    data: DataXml,
}

#[derive(Debug, Deserialize, PartialEq)]
struct DataXml {
    #[serde(rename = "type")]
    data_type: String,
}

lazy_static! {
    /// The base Diameter protocol plus the 3GPP S6a/S6d AVP set (TS 29.272),
    /// wide enough to cover every AVP the HSS command handlers touch.
    pub static ref DEFAULT_DICT_XML: &'static str = r#"
<diameter>
    <application id="0" name="Base">
        <avp name="user_name" code="1"><data type="UTF8String"/></avp>
        <avp name="session_id" code="263"><data type="UTF8String"/></avp>
        <avp name="origin_host" code="264"><data type="DiameterIdentity"/></avp>
        <avp name="origin_realm" code="296"><data type="DiameterIdentity"/></avp>
        <avp name="destination_host" code="293"><data type="DiameterIdentity"/></avp>
        <avp name="destination_realm" code="283"><data type="DiameterIdentity"/></avp>
        <avp name="auth_application_id" code="258"><data type="Unsigned32"/></avp>
        <avp name="result_code" code="268"><data type="Unsigned32"/></avp>
        <avp name="vendor_id" code="266"><data type="Unsigned32"/></avp>
        <avp name="auth_session_state" code="277"><data type="Enumerated"/></avp>
        <avp name="origin_state_id" code="278"><data type="Unsigned32"/></avp>
        <avp name="error_message" code="281"><data type="UTF8String"/></avp>
        <avp name="error_diagnostic" code="2103" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="failed_avp" code="279"><data type="Grouped"/></avp>
        <avp name="experimental_result" code="297"><data type="Grouped"/></avp>
        <avp name="experimental_result_code" code="298"><data type="Unsigned32"/></avp>
        <avp name="vendor_specific_application_id" code="260"><data type="Grouped"/></avp>
        <avp name="host_ip_address" code="257"><data type="OctetString"/></avp>
        <avp name="product_name" code="269"><data type="UTF8String"/></avp>
        <avp name="origin_state_id_alt" code="278"><data type="Unsigned32"/></avp>
        <avp name="cc_request_type" code="416"><data type="Enumerated"/></avp>
        <avp name="cc_request_number" code="415"><data type="Unsigned32"/></avp>
        <avp name="called_station_id" code="30"><data type="UTF8String"/></avp>
        <avp name="service_selection" code="493"><data type="UTF8String"/></avp>
        <avp name="mip6_agent_info" code="486"><data type="Grouped"/></avp>
        <avp name="mip_home_agent_host" code="348"><data type="Grouped"/></avp>
        <avp name="max_requested_bandwidth_ul" code="516"><data type="Unsigned32"/></avp>
        <avp name="max_requested_bandwidth_dl" code="515"><data type="Unsigned32"/></avp>
    </application>

    <application id="16777251" name="3GPP S6a/S6d">
        <avp name="visited_plmn_id" code="1407" vendor-id="10415"><data type="OctetString"/></avp>
        <avp name="rat_type" code="1032" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="ulr_flags" code="1405" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="ula_flags" code="1406" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="ue_srvcc_capability" code="1615" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="supported_features" code="628" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="feature_list_id" code="629" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="feature_list" code="630" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="requested_eutran_authentication_info" code="1408" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="number_of_requested_vectors" code="1410" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="immediate_response_preferred" code="1412" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="re_synchronization_info" code="1411" vendor-id="10415"><data type="OctetString"/></avp>
        <avp name="authentication_info" code="1413" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="e_utran_vector" code="1414" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="item_number" code="1419" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="rand" code="1447" vendor-id="10415"><data type="OctetString"/></avp>
        <avp name="xres" code="1448" vendor-id="10415"><data type="OctetString"/></avp>
        <avp name="autn" code="1449" vendor-id="10415"><data type="OctetString"/></avp>
        <avp name="kasme" code="1450" vendor-id="10415"><data type="OctetString"/></avp>
        <avp name="subscription_data" code="1400" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="msisdn" code="701" vendor-id="10415"><data type="OctetString"/></avp>
        <avp name="stn_sr" code="1433" vendor-id="10415"><data type="OctetString"/></avp>
        <avp name="subscriber_status" code="1424" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="operator_determined_barring" code="1425" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="x3gpp_charging_characteristics" code="13" vendor-id="10415"><data type="OctetString"/></avp>
        <avp name="ambr" code="1435" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="apn_configuration_profile" code="1429" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="context_identifier" code="1423" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="all_apn_configurations_included_indicator" code="1428" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="apn_configuration" code="1430" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="pdn_type" code="1456" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="eps_subscribed_qos_profile" code="1431" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="qos_class_identifier" code="1028" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="allocation_retention_priority" code="1034" vendor-id="10415"><data type="Grouped"/></avp>
        <avp name="priority_level" code="1046" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="vplmn_dynamic_address_allowed" code="1432" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="pdn_gw_allocation_type" code="1438" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="cancellation_type" code="1420" vendor-id="10415"><data type="Enumerated"/></avp>
        <avp name="pua_flags" code="1442" vendor-id="10415"><data type="Unsigned32"/></avp>
        <avp name="terminal_information" code="1401" vendor-id="10415"><data type="Grouped"/></avp>
    </application>
</diameter>
    "#;
}
