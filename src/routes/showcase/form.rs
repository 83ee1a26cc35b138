use axum::extract::Multipart;

use super::model::{ItemFields, ShowcaseItem};
use crate::error::{AppError, AppResult};

/// 表单中的一个上传文件
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 展示项编辑表单，新建与修改共用；修改时缺省字段沿用原值
#[derive(Debug, Default)]
pub struct ItemForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub is_active: Option<bool>,
    pub is_digital: Option<bool>,
    pub digital_file: Option<UploadedFile>,
    pub images: Vec<UploadedFile>,
}

/// 校验后的表单
#[derive(Debug)]
pub struct ItemDraft {
    pub fields: ItemFields,
    pub digital_file: Option<UploadedFile>,
    pub images: Vec<UploadedFile>,
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" | "" => Ok(false),
        other => Err(format!("invalid boolean value: {}", other)),
    }
}

/// 空价格表示未标价；标价必须是非负数
pub fn parse_price(value: &str) -> Result<Option<f64>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let price: f64 = value
        .parse()
        .map_err(|_| format!("invalid price: {}", value))?;
    if !price.is_finite() || price < 0.0 {
        return Err("price must be a non-negative number".into());
    }
    Ok(Some(price))
}

impl ItemForm {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = ItemForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            match name.as_str() {
                "digital_file" | "images" | "images[]" | "image" => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(e.body_text()))?;
                    // 浏览器未选择文件时也会提交一个空字段
                    let Some(file_name) = file_name.filter(|n| !n.is_empty()) else {
                        continue;
                    };
                    if bytes.is_empty() {
                        continue;
                    }
                    let file = UploadedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    };
                    if name == "digital_file" {
                        form.digital_file = Some(file);
                    } else {
                        form.images.push(file);
                    }
                }
                _ => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.body_text()))?;
                    form.set_text(&name, text).map_err(AppError::Validation)?;
                }
            }
        }

        Ok(form)
    }

    fn set_text(&mut self, name: &str, text: String) -> Result<(), String> {
        match name {
            "title" => self.title = Some(text),
            "description" => self.description = Some(text),
            "category" => self.category = Some(text),
            "price" => self.price = Some(text),
            "is_active" => self.is_active = Some(parse_flag(&text)?),
            "is_digital" => self.is_digital = Some(parse_flag(&text)?),
            other => tracing::debug!("Ignoring unknown item form field {}", other),
        }
        Ok(())
    }

    /// 与原记录（修改时）合并并校验
    pub fn into_draft(self, existing: Option<&ShowcaseItem>) -> Result<ItemDraft, String> {
        let title = match (self.title, existing) {
            (Some(title), _) => title.trim().to_string(),
            (None, Some(item)) => item.title.clone(),
            (None, None) => String::new(),
        };
        if title.is_empty() {
            return Err("title is required".into());
        }

        let price = match (self.price, existing) {
            (Some(raw), _) => parse_price(&raw)?,
            (None, Some(item)) => item.price,
            (None, None) => None,
        };

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .or_else(|| existing.map(|i| i.description.clone()))
            .unwrap_or_default();
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .or_else(|| existing.map(|i| i.category.clone()))
            .unwrap_or_default();
        let is_active = self
            .is_active
            .or(existing.map(|i| i.is_active))
            .unwrap_or(true);
        let is_digital = self
            .is_digital
            .or(existing.map(|i| i.is_digital))
            .unwrap_or(false);

        let has_stored_file = existing.is_some_and(|i| i.digital_file_url.is_some());
        let digital_file = if is_digital {
            if self.digital_file.is_none() && !has_stored_file {
                return Err("a digital item needs a digital file".into());
            }
            self.digital_file
        } else {
            None
        };

        Ok(ItemDraft {
            fields: ItemFields {
                title,
                description,
                category,
                price,
                is_active,
                is_digital,
            },
            digital_file,
            images: self.images,
        })
    }
}
