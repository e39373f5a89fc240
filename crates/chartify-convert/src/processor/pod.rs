//! Pod spec transformer
//!
//! Shared by every kind that embeds a pod template. Given the owning
//! object's values key and its pod spec, it returns the rewritten spec and
//! the values it extracted, in this order:
//!
//! 1. container images, split into `image.repository` / `image.tag`
//! 2. literal env values, moved to `env.<name>`; the cluster domain env var
//!    is appended to every container
//! 3. names referencing other objects (envFrom, volumes, pull secrets,
//!    service account) go through the naming service
//! 4. resource requests and limits, replaced as one opaque block
//! 5. `imagePullPolicy`, when set
//! 6. `nodeSelector`, replaced as one opaque block
//! 7. the `imagePullSecrets` toggle, only when the spec declares none
//! 8. security contexts
//!
//! `indent` is the column the pod spec's own fields are rendered at; block
//! substitutions are indented relative to it.

use chartify_core::{AppMetadata, DOMAIN_ENV, DOMAIN_KEY, Value, Values, to_lower_camel};
use serde_json::{Value as JsonValue, json};

use crate::error::{ConvertError, Result};
use crate::processor::security_context;
use crate::unstructured::{
    JsonMap, get_object, get_object_mut, get_str, objects_mut, template_name, template_ref,
};

/// Container lists of a pod spec, in processing order
pub(crate) const CONTAINER_FIELDS: [&str; 2] = ["containers", "initContainers"];

/// Template for the top-level pull secrets toggle
const IMAGE_PULL_SECRETS_TEMPLATE: &str = "{{ .Values.imagePullSecrets | default list | toJson }}";

/// Rewritten pod spec and the values extracted from it
#[derive(Debug, Clone, PartialEq)]
pub struct PodSpec {
    pub spec: JsonMap,
    pub values: Values,
}

/// Template a pod spec owned by the object with values key `object_key`
pub fn process(
    object_key: &str,
    app_meta: &AppMetadata,
    mut spec: JsonMap,
    indent: usize,
) -> Result<PodSpec> {
    let mut values = Values::new();

    for field in CONTAINER_FIELDS {
        let path = format!("spec.{}", field);
        for container in objects_mut(&mut spec, field, "spec")? {
            process_container(object_key, app_meta, container, &mut values, indent, &path)?;
        }
    }

    for volume in objects_mut(&mut spec, "volumes", "spec")? {
        process_volume(app_meta, volume)?;
    }

    template_name(&mut spec, "serviceAccountName", "spec", app_meta)?;
    for secret in objects_mut(&mut spec, "imagePullSecrets", "spec")? {
        template_name(secret, "name", "spec.imagePullSecrets", app_meta)?;
    }

    let node_selector = get_object(&spec, "nodeSelector", "spec")?
        .filter(|selector| !selector.is_empty())
        .cloned();
    if let Some(selector) = node_selector {
        values.set_at_path(JsonValue::Object(selector), &[object_key, "nodeSelector"])?;
        spec.insert(
            "nodeSelector".to_string(),
            JsonValue::String(format!(
                "{{{{- toYaml .Values.{}.nodeSelector | nindent {} }}}}",
                object_key,
                indent + 2
            )),
        );
    }

    if app_meta.config().image_pull_secrets && !spec.contains_key("imagePullSecrets") {
        spec.insert(
            "imagePullSecrets".to_string(),
            JsonValue::String(IMAGE_PULL_SECRETS_TEMPLATE.to_string()),
        );
        values.set_at_path(Value::Sequence(Vec::new()), &["imagePullSecrets"])?;
    }

    security_context::process(object_key, &mut spec, &mut values, indent)?;

    Ok(PodSpec { spec, values })
}

fn process_container(
    object_key: &str,
    app_meta: &AppMetadata,
    container: &mut JsonMap,
    values: &mut Values,
    indent: usize,
    path: &str,
) -> Result<()> {
    let name = get_str(container, "name", path)?
        .ok_or_else(|| ConvertError::field_shape(format!("{}.name", path), "container name is required"))?
        .to_string();
    let key = to_lower_camel(&name);
    let path = format!("{}[{}]", path, name);

    let image = get_str(container, "image", &path)?
        .ok_or_else(|| ConvertError::field_shape(format!("{}.image", path), "container image is required"))?
        .to_string();
    let (repository, tag) = image
        .rsplit_once(':')
        .ok_or_else(|| ConvertError::InvalidImageFormat {
            container: name.clone(),
            image: image.clone(),
        })?;
    values.set_at_path(repository, &[object_key, &key, "image", "repository"])?;
    values.set_at_path(tag, &[object_key, &key, "image", "tag"])?;
    container.insert(
        "image".to_string(),
        JsonValue::String(format!(
            "{{{{ .Values.{0}.{1}.image.repository }}}}:{{{{ .Values.{0}.{1}.image.tag | default .Chart.AppVersion }}}}",
            object_key, key
        )),
    );

    process_env(object_key, &key, app_meta, container, values, &path)?;

    for source in objects_mut(container, "envFrom", &path)? {
        template_ref(source, "configMapRef", "name", "envFrom", app_meta)?;
        template_ref(source, "secretRef", "name", "envFrom", app_meta)?;
    }

    let mut recorded = false;
    if let Some(resources) = get_object(container, "resources", &path)? {
        let resources_path = format!("{}.resources", path);
        for group in ["requests", "limits"] {
            if let Some(quantities) = get_object(resources, group, &resources_path)? {
                for (resource, quantity) in quantities {
                    values.set_at_path(
                        quantity.clone(),
                        &[object_key, &key, "resources", group, resource],
                    )?;
                    recorded = true;
                }
            }
        }
    }
    if recorded {
        container.insert(
            "resources".to_string(),
            JsonValue::String(format!(
                "{{{{- toYaml .Values.{}.{}.resources | nindent {} }}}}",
                object_key,
                key,
                indent + 4
            )),
        );
    }

    if let Some(policy) = get_str(container, "imagePullPolicy", &path)?.map(str::to_string) {
        values.set_at_path(policy, &[object_key, &key, "imagePullPolicy"])?;
        container.insert(
            "imagePullPolicy".to_string(),
            JsonValue::String(format!(
                "{{{{ .Values.{}.{}.imagePullPolicy }}}}",
                object_key, key
            )),
        );
    }

    Ok(())
}

fn process_env(
    object_key: &str,
    container_key: &str,
    app_meta: &AppMetadata,
    container: &mut JsonMap,
    values: &mut Values,
    path: &str,
) -> Result<()> {
    let env_path = format!("{}.env", path);
    for var in objects_mut(container, "env", path)? {
        let var_name = get_str(var, "name", &env_path)?
            .ok_or_else(|| ConvertError::field_shape(format!("{}.name", env_path), "env name is required"))?
            .to_string();

        if let Some(source) = get_object_mut(var, "valueFrom", &env_path)? {
            template_ref(source, "secretKeyRef", "name", &env_path, app_meta)?;
            template_ref(source, "configMapKeyRef", "name", &env_path, app_meta)?;
            continue;
        }

        let value = match var.get("value") {
            None | Some(JsonValue::Null) => JsonValue::String(String::new()),
            Some(JsonValue::Array(_)) | Some(JsonValue::Object(_)) => {
                return Err(ConvertError::field_shape(
                    format!("{}[{}].value", env_path, var_name),
                    "env value must be a scalar",
                ));
            }
            Some(scalar) => scalar.clone(),
        };
        let env_key = to_lower_camel(&var_name.to_lowercase());
        values.set_at_path(value, &[object_key, container_key, "env", &env_key])?;
        var.insert(
            "value".to_string(),
            JsonValue::String(format!(
                "{{{{ quote .Values.{}.{}.env.{} }}}}",
                object_key, container_key, env_key
            )),
        );
    }

    let domain_var = json!({
        "name": DOMAIN_ENV,
        "value": format!("{{{{ quote .Values.{} }}}}", DOMAIN_KEY),
    });
    match container.get_mut("env") {
        Some(JsonValue::Array(vars)) => vars.push(domain_var),
        _ => {
            container.insert("env".to_string(), JsonValue::Array(vec![domain_var]));
        }
    }
    values.set_at_path(app_meta.config().cluster_domain.as_str(), &[DOMAIN_KEY])?;

    Ok(())
}

fn process_volume(app_meta: &AppMetadata, volume: &mut JsonMap) -> Result<()> {
    let path = "spec.volumes";
    template_ref(volume, "configMap", "name", path, app_meta)?;
    template_ref(volume, "secret", "secretName", path, app_meta)?;
    template_ref(volume, "persistentVolumeClaim", "claimName", path, app_meta)?;

    if let Some(projected) = get_object_mut(volume, "projected", path)? {
        for source in objects_mut(projected, "sources", "spec.volumes.projected")? {
            template_ref(source, "configMap", "name", path, app_meta)?;
            template_ref(source, "secret", "name", path, app_meta)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartify_core::Config;

    fn app_meta(image_pull_secrets: bool) -> AppMetadata {
        AppMetadata::new(Config {
            app_name: Some("my-app".to_string()),
            image_pull_secrets,
            ..Default::default()
        })
    }

    fn spec(value: JsonValue) -> JsonMap {
        value.as_object().cloned().unwrap()
    }

    fn leaf<'a>(values: &'a Values, path: &[&str]) -> &'a str {
        values.get(path).and_then(Value::as_str).unwrap()
    }

    #[test]
    fn test_image_round_trip() {
        for image in ["nginx:1.25", "registry.local:5000/team/app:v2", "busybox@sha256:abc123"] {
            let out = process(
                "web",
                &app_meta(false),
                spec(json!({"containers": [{"name": "app", "image": image}]})),
                6,
            )
            .unwrap();

            let template = out.spec["containers"][0]["image"].as_str().unwrap();
            let rendered = template
                .replace(
                    "{{ .Values.web.app.image.repository }}",
                    leaf(&out.values, &["web", "app", "image", "repository"]),
                )
                .replace(
                    "{{ .Values.web.app.image.tag | default .Chart.AppVersion }}",
                    leaf(&out.values, &["web", "app", "image", "tag"]),
                );
            assert_eq!(rendered, image);
        }
    }

    #[test]
    fn test_image_without_tag_fails() {
        let err = process(
            "web",
            &app_meta(false),
            spec(json!({"containers": [{"name": "app", "image": "nginx"}]})),
            6,
        )
        .unwrap_err();

        match err {
            ConvertError::InvalidImageFormat { container, image } => {
                assert_eq!(container, "app");
                assert_eq!(image, "nginx");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resources_only_for_declaring_container() {
        let out = process(
            "web",
            &app_meta(false),
            spec(json!({"containers": [
                {
                    "name": "app",
                    "image": "app:1",
                    "resources": {"requests": {"cpu": "100m", "memory": "64Mi"}, "limits": {"memory": "128Mi"}}
                },
                {"name": "sidecar", "image": "proxy:2"}
            ]})),
            6,
        )
        .unwrap();

        assert_eq!(leaf(&out.values, &["web", "app", "resources", "requests", "cpu"]), "100m");
        assert_eq!(leaf(&out.values, &["web", "app", "resources", "limits", "memory"]), "128Mi");
        assert!(out.values.get(&["web", "sidecar", "resources"]).is_none());

        assert_eq!(
            out.spec["containers"][0]["resources"],
            json!("{{- toYaml .Values.web.app.resources | nindent 10 }}")
        );
        assert!(out.spec["containers"][1].get("resources").is_none());
    }

    #[test]
    fn test_empty_resources_left_alone() {
        let out = process(
            "web",
            &app_meta(false),
            spec(json!({"containers": [{"name": "app", "image": "app:1", "resources": {}}]})),
            6,
        )
        .unwrap();
        assert_eq!(out.spec["containers"][0]["resources"], json!({}));
    }

    #[test]
    fn test_env_values_and_references() {
        let out = process(
            "controllerManager",
            &app_meta(false),
            spec(json!({"containers": [{
                "name": "manager",
                "image": "controller:latest",
                "env": [
                    {"name": "LOG_LEVEL", "value": "debug"},
                    {"name": "PASSWORD", "valueFrom": {"secretKeyRef": {"name": "my-app-db", "key": "password"}}},
                    {"name": "POD_NAME", "valueFrom": {"fieldRef": {"fieldPath": "metadata.name"}}}
                ]
            }]})),
            6,
        )
        .unwrap();

        let env = out.spec["containers"][0]["env"].as_array().unwrap();
        assert_eq!(
            env[0]["value"],
            json!("{{ quote .Values.controllerManager.manager.env.logLevel }}")
        );
        assert_eq!(
            env[1]["valueFrom"]["secretKeyRef"]["name"],
            json!("{{ include \"chart.fullname\" . }}-db")
        );
        assert_eq!(env[2]["valueFrom"]["fieldRef"]["fieldPath"], json!("metadata.name"));
        assert_eq!(env.len(), 4);
        assert_eq!(env[3]["name"], json!("KUBERNETES_CLUSTER_DOMAIN"));
        assert_eq!(env[3]["value"], json!("{{ quote .Values.kubernetesClusterDomain }}"));

        assert_eq!(
            leaf(&out.values, &["controllerManager", "manager", "env", "logLevel"]),
            "debug"
        );
        assert!(out.values.get(&["controllerManager", "manager", "env", "password"]).is_none());
        assert_eq!(leaf(&out.values, &["kubernetesClusterDomain"]), "cluster.local");
    }

    #[test]
    fn test_domain_env_added_without_env() {
        let out = process(
            "web",
            &app_meta(false),
            spec(json!({"containers": [{"name": "app", "image": "app:1"}]})),
            6,
        )
        .unwrap();
        assert_eq!(
            out.spec["containers"][0]["env"],
            json!([{"name": "KUBERNETES_CLUSTER_DOMAIN", "value": "{{ quote .Values.kubernetesClusterDomain }}"}])
        );
    }

    #[test]
    fn test_references_are_templated() {
        let out = process(
            "web",
            &app_meta(false),
            spec(json!({
                "serviceAccountName": "my-app-controller-manager",
                "imagePullSecrets": [{"name": "my-app-registry"}, {"name": "shared-registry"}],
                "containers": [{
                    "name": "app",
                    "image": "app:1",
                    "envFrom": [{"configMapRef": {"name": "my-app-env"}}, {"secretRef": {"name": "external"}}]
                }],
                "volumes": [
                    {"name": "a", "configMap": {"name": "my-app-config"}},
                    {"name": "b", "secret": {"secretName": "my-app-certs"}},
                    {"name": "c", "persistentVolumeClaim": {"claimName": "my-app-data"}},
                    {"name": "d", "emptyDir": {}}
                ]
            })),
            6,
        )
        .unwrap();

        let fullname = "{{ include \"chart.fullname\" . }}";
        assert_eq!(out.spec["serviceAccountName"], json!(format!("{}-controller-manager", fullname)));
        assert_eq!(out.spec["imagePullSecrets"][0]["name"], json!(format!("{}-registry", fullname)));
        assert_eq!(out.spec["imagePullSecrets"][1]["name"], json!("shared-registry"));

        let env_from = &out.spec["containers"][0]["envFrom"];
        assert_eq!(env_from[0]["configMapRef"]["name"], json!(format!("{}-env", fullname)));
        assert_eq!(env_from[1]["secretRef"]["name"], json!("external"));

        let volumes = &out.spec["volumes"];
        assert_eq!(volumes[0]["configMap"]["name"], json!(format!("{}-config", fullname)));
        assert_eq!(volumes[1]["secret"]["secretName"], json!(format!("{}-certs", fullname)));
        assert_eq!(volumes[2]["persistentVolumeClaim"]["claimName"], json!(format!("{}-data", fullname)));
        assert_eq!(volumes[3]["emptyDir"], json!({}));
    }

    #[test]
    fn test_pull_policy_and_node_selector() {
        let out = process(
            "web",
            &app_meta(false),
            spec(json!({
                "nodeSelector": {"kubernetes.io/os": "linux"},
                "containers": [{"name": "app", "image": "app:1", "imagePullPolicy": "IfNotPresent"}]
            })),
            6,
        )
        .unwrap();

        assert_eq!(
            out.spec["containers"][0]["imagePullPolicy"],
            json!("{{ .Values.web.app.imagePullPolicy }}")
        );
        assert_eq!(leaf(&out.values, &["web", "app", "imagePullPolicy"]), "IfNotPresent");
        assert_eq!(
            out.spec["nodeSelector"],
            json!("{{- toYaml .Values.web.nodeSelector | nindent 8 }}")
        );
        assert_eq!(leaf(&out.values, &["web", "nodeSelector", "kubernetes.io/os"]), "linux");
    }

    #[test]
    fn test_absent_pull_policy_stays_absent() {
        let out = process(
            "web",
            &app_meta(false),
            spec(json!({"containers": [{"name": "app", "image": "app:1"}]})),
            6,
        )
        .unwrap();
        assert!(out.spec["containers"][0].get("imagePullPolicy").is_none());
        assert!(out.values.get(&["web", "app", "imagePullPolicy"]).is_none());
        assert!(!out.spec.contains_key("nodeSelector"));
    }

    #[test]
    fn test_image_pull_secrets_toggle() {
        let out = process(
            "web",
            &app_meta(true),
            spec(json!({"containers": [{"name": "app", "image": "app:1"}]})),
            6,
        )
        .unwrap();
        assert_eq!(
            out.spec["imagePullSecrets"],
            json!("{{ .Values.imagePullSecrets | default list | toJson }}")
        );
        assert_eq!(out.values.get(&["imagePullSecrets"]), Some(&Value::Sequence(vec![])));
    }

    #[test]
    fn test_existing_image_pull_secrets_not_overridden() {
        let out = process(
            "web",
            &app_meta(true),
            spec(json!({
                "imagePullSecrets": [{"name": "regcred"}],
                "containers": [{"name": "app", "image": "app:1"}]
            })),
            6,
        )
        .unwrap();
        assert_eq!(out.spec["imagePullSecrets"], json!([{"name": "regcred"}]));
        assert!(out.values.get(&["imagePullSecrets"]).is_none());
    }

    #[test]
    fn test_values_follow_container_order() {
        let out = process(
            "web",
            &app_meta(false),
            spec(json!({
                "containers": [{"name": "zeta", "image": "z:1"}, {"name": "alpha", "image": "a:1"}],
                "initContainers": [{"name": "init-db", "image": "busybox:1.36"}]
            })),
            6,
        )
        .unwrap();
        let keys: Vec<_> = out.values.inner()["web"]
            .as_mapping()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "initDb"]);
    }

    #[test]
    fn test_containers_must_be_sequence() {
        let err = process("web", &app_meta(false), spec(json!({"containers": {"name": "app"}})), 6)
            .unwrap_err();
        assert!(matches!(err, ConvertError::FieldShape { .. }));
    }
}
