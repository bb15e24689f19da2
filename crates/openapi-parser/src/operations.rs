//! Operation extraction from OpenAPI specs

use crate::resolver::RefResolver;
use crate::types::*;
use tracing::debug;

/// Extracts operations from raw OpenAPI spec structures
pub struct OperationExtractor;

impl OperationExtractor {
    /// Extract all operations, resolving `$ref`s against `resolver`'s document
    pub fn extract(spec: &RawOpenApiSpec, resolver: &RefResolver) -> Vec<ApiOperation> {
        let mut operations = Vec::new();

        for (path, path_item) in &spec.paths {
            let path_params: Vec<OperationParameter> = path_item
                .parameters
                .iter()
                .filter_map(|p| Self::convert_parameter(p, resolver))
                .collect();

            for method in HttpMethod::ALL {
                if let Some(op) = path_item.operation(method) {
                    operations.push(Self::extract_operation(
                        path,
                        method,
                        op,
                        &path_params,
                        resolver,
                    ));
                }
            }
        }

        operations
    }

    fn extract_operation(
        path: &str,
        method: HttpMethod,
        operation: &RawOperation,
        path_params: &[OperationParameter],
        resolver: &RefResolver,
    ) -> ApiOperation {
        let operation_id = operation
            .operation_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Self::generate_operation_id(path, method));

        // Operation-level parameters override path-level ones with the same name and location
        let mut parameters = path_params.to_vec();
        for param in &operation.parameters {
            if let Some(p) = Self::convert_parameter(param, resolver) {
                parameters.retain(|existing| {
                    !(existing.name == p.name && existing.location == p.location)
                });
                parameters.push(p);
            }
        }

        let request_body = operation
            .request_body
            .as_ref()
            .and_then(|body| Self::extract_request_body(body, resolver));

        ApiOperation {
            operation_id,
            method,
            path: path.to_string(),
            summary: operation.summary.clone(),
            description: operation.description.clone(),
            tags: operation.tags.clone(),
            deprecated: operation.deprecated,
            parameters,
            request_body,
        }
    }

    /// Generate an operation ID from path and method
    fn generate_operation_id(path: &str, method: HttpMethod) -> String {
        // /api/battles/{id}/creatures -> get_api_battles_id_creatures
        let path_part = path
            .trim_start_matches('/')
            .replace('/', "_")
            .replace(['{', '}'], "");

        format!("{}_{}", method.path_item_key(), path_part)
    }

    fn convert_parameter(param: &RawParameter, resolver: &RefResolver) -> Option<OperationParameter> {
        let resolved;
        let param = match &param.reference {
            Some(reference) => {
                resolved = resolver.lookup_as::<RawParameter>(reference)?;
                &resolved
            }
            None => param,
        };

        let location = match param.location.as_str() {
            "path" => ParameterLocation::Path,
            "query" => ParameterLocation::Query,
            "header" => ParameterLocation::Header,
            "cookie" => ParameterLocation::Cookie,
            other => {
                debug!("Skipping parameter {} with location {:?}", param.name, other);
                return None;
            }
        };

        Some(OperationParameter {
            name: param.name.clone(),
            location,
            required: param.required || location == ParameterLocation::Path,
            description: param.description.clone(),
            schema: param.schema.as_ref().map(|s| resolver.resolve(s)),
            example: param.example.clone(),
            deprecated: param.deprecated,
        })
    }

    fn extract_request_body(body: &RawRequestBody, resolver: &RefResolver) -> Option<RequestBody> {
        let resolved;
        let body = match &body.reference {
            Some(reference) => {
                resolved = resolver.lookup_as::<RawRequestBody>(reference)?;
                &resolved
            }
            None => body,
        };

        // Prefer JSON content type
        let (content_type, media) = body
            .content
            .iter()
            .find(|(ct, _)| ct.contains("json"))
            .or_else(|| body.content.first())?;

        Some(RequestBody {
            required: body.required,
            content_type: content_type.clone(),
            schema: media.schema.as_ref().map(|s| resolver.resolve(s)),
            description: body.description.clone(),
        })
    }
}
