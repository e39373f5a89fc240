//! Admission webhooks and their cert-manager plumbing
//!
//! Issuers and certificates land in a shared `cert-manager.yaml`. Webhook
//! configurations point at the chart's own service in the release
//! namespace, and the `cert-manager.io/inject-ca-from` annotation is
//! rewritten to the templated certificate.

use chartify_core::{AppMetadata, ChartInfo, DOMAIN_KEY, RELEASE_NAMESPACE, Values};
use serde_json::Value as JsonValue;

use crate::error::{ConvertError, Result};
use crate::object::{Object, type_name};
use crate::processor::{Fragment, meta};
use crate::unstructured::{
    JsonMap, get_object_mut, objects_mut, template_name, template_ref, template_service_ref,
};
use crate::yaml::marshal_map;

const CERT_MANAGER_FILE: &str = "cert-manager.yaml";
const WEBHOOKS_FILE: &str = "webhooks.yaml";

/// Annotation cert-manager's CA injector reads, `<namespace>/<certificate>`
pub const INJECT_CA_FROM: &str = "cert-manager.io/inject-ca-from";

pub fn issuer(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<Fragment> {
    let mut text = meta::render(info, app_meta, obj)?;
    let body = obj.body();
    if !body.is_empty() {
        text.push_str(&marshal_map(&body, 0)?);
    }
    Ok(Fragment::new(CERT_MANAGER_FILE, text, Values::new()))
}

pub fn certificate(info: &ChartInfo, app_meta: &AppMetadata, obj: &Object) -> Result<Fragment> {
    let mut text = meta::render(info, app_meta, obj)?;
    let mut body = obj.body();
    let mut values = Values::new();

    if let Some(spec) = get_object_mut(&mut body, "spec", "")? {
        let dns_names: &mut [JsonValue] = match spec.get_mut("dnsNames") {
            None | Some(JsonValue::Null) => Default::default(),
            Some(JsonValue::Array(items)) => items.as_mut_slice(),
            Some(other) => {
                return Err(ConvertError::field_shape(
                    "spec.dnsNames",
                    format!("expected a sequence, found {}", type_name(other)),
                ));
            }
        };
        for (i, entry) in dns_names.iter_mut().enumerate() {
            let (templated, uses_domain) = match entry {
                JsonValue::String(dns_name) => template_dns_name(app_meta, dns_name),
                other => {
                    return Err(ConvertError::field_shape(
                        format!("spec.dnsNames[{}]", i),
                        format!("expected a string, found {}", type_name(other)),
                    ));
                }
            };
            if uses_domain {
                values.set_at_path(app_meta.config().cluster_domain.as_str(), &[DOMAIN_KEY])?;
            }
            *entry = JsonValue::String(templated);
        }
        template_name(spec, "secretName", "spec", app_meta)?;
        template_ref(spec, "issuerRef", "name", "spec", app_meta)?;
    }

    if !body.is_empty() {
        text.push_str(&marshal_map(&body, 0)?);
    }
    Ok(Fragment::new(CERT_MANAGER_FILE, text, values))
}

/// Mutating and validating webhook configurations
pub fn webhook_configuration(
    info: &ChartInfo,
    app_meta: &AppMetadata,
    obj: &Object,
) -> Result<Fragment> {
    let name = app_meta.templated_name(obj.name());
    let annotations = meta::annotations(obj)?.map(|a| inject_ca_annotation(app_meta, a));
    let mut text = meta::render_with(info, obj, &name, annotations.as_ref())?;

    let mut body = obj.body();
    for (i, webhook) in objects_mut(&mut body, "webhooks", "")?.into_iter().enumerate() {
        let path = format!("webhooks[{}]", i);
        let Some(client_config) = get_object_mut(webhook, "clientConfig", &path)? else {
            continue;
        };
        let path = format!("{}.clientConfig", path);
        if let Some(service) = get_object_mut(client_config, "service", &path)? {
            template_service_ref(service, &format!("{}.service", path), app_meta)?;
            service.insert(
                "namespace".to_string(),
                JsonValue::String(RELEASE_NAMESPACE.to_string()),
            );
        }
    }
    if !body.is_empty() {
        text.push_str(&marshal_map(&body, 0)?);
    }

    Ok(Fragment::new(WEBHOOKS_FILE, text, Values::new()))
}

/// Point the CA injection annotation at the templated certificate
pub(crate) fn inject_ca_annotation(app_meta: &AppMetadata, mut annotations: JsonMap) -> JsonMap {
    if let Some(JsonValue::String(source)) = annotations.get(INJECT_CA_FROM) {
        let certificate = source.split_once('/').map_or(source.as_str(), |(_, cert)| cert);
        let rewritten = format!("{}/{}", RELEASE_NAMESPACE, app_meta.templated_name(certificate));
        annotations.insert(INJECT_CA_FROM.to_string(), JsonValue::String(rewritten));
    }
    annotations
}

/// Template a certificate DNS name such as `my-app-webhook.my-app-system.svc.cluster.local`
///
/// Returns the templated name and whether it references the cluster domain.
fn template_dns_name(app_meta: &AppMetadata, dns_name: &str) -> (String, bool) {
    let domain_suffix = format!(".svc.{}", app_meta.config().cluster_domain);
    let (host, suffix, uses_domain) = match dns_name.strip_suffix(&domain_suffix) {
        Some(host) => (
            host,
            format!(".svc.{{{{ .Values.{} }}}}", DOMAIN_KEY),
            true,
        ),
        None => (dns_name, String::new(), false),
    };

    let namespace = app_meta.namespace();
    let labels: Vec<String> = host
        .split('.')
        .enumerate()
        .map(|(i, label)| {
            if i == 0 {
                app_meta.templated_name(label)
            } else if namespace == Some(label) {
                RELEASE_NAMESPACE.to_string()
            } else {
                label.to_string()
            }
        })
        .collect();

    (format!("{}{}", labels.join("."), suffix), uses_domain)
}
